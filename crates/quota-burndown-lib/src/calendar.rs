use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A single date whose working status differs from the weekday rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOverride {
    #[serde(default)]
    pub name: String,
    pub date: NaiveDate,
    #[serde(rename = "isOffDay")]
    pub is_off_day: bool,
}

/// Overrides for one year, in the holiday-cn document shape:
/// `{"year": 2024, "days": [{"name": "...", "date": "2024-02-04", "isOffDay": false}]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "YearDocument", into = "YearDocument")]
pub struct YearOverrides {
    days: HashMap<NaiveDate, DayOverride>,
}

#[derive(Serialize, Deserialize)]
struct YearDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    year: Option<i32>,
    #[serde(default)]
    days: Vec<DayOverride>,
}

impl From<YearDocument> for YearOverrides {
    fn from(doc: YearDocument) -> Self {
        Self::from_days(doc.days)
    }
}

impl From<YearOverrides> for YearDocument {
    fn from(overrides: YearOverrides) -> Self {
        let mut days: Vec<DayOverride> = overrides.days.into_values().collect();
        days.sort_by_key(|day| day.date);
        Self {
            year: days.first().map(|day| day.date.year()),
            days,
        }
    }
}

impl YearOverrides {
    pub fn from_days(days: impl IntoIterator<Item = DayOverride>) -> Self {
        // Later entries for the same date win.
        let days = days.into_iter().map(|day| (day.date, day)).collect();
        Self { days }
    }

    /// `Some(true)` for a forced working day, `Some(false)` for a day off,
    /// `None` when the date is not listed.
    pub fn is_working(&self, date: NaiveDate) -> Option<bool> {
        self.days.get(&date).map(|day| !day.is_off_day)
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}

/// Working-day exceptions keyed by year. An empty table degrades to the
/// plain Monday-Friday rule.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    years: BTreeMap<i32, YearOverrides>,
}

impl OverrideTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_year(&mut self, year: i32, overrides: YearOverrides) {
        self.years.insert(year, overrides);
    }

    pub fn year(&self, year: i32) -> Option<&YearOverrides> {
        self.years.get(&year)
    }
}

pub fn is_working_day(date: NaiveDate, overrides: &OverrideTable) -> bool {
    overrides
        .year(date.year())
        .and_then(|year| year.is_working(date))
        .unwrap_or_else(|| date.weekday().num_days_from_monday() < 5)
}
