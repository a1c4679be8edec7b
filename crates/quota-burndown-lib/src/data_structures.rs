use anyhow::{bail, Result};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Per-category sub-totals attached to an actual sample.
pub type ModelBreakdown = BTreeMap<String, f64>;

/// Cumulative planned value for every calendar day of a range.
pub type PlannedSeries = BTreeMap<NaiveDate, f64>;

/// Observed actual usage keyed by the day it was observed.
pub type ActualSamples = BTreeMap<NaiveDate, ActualSample>;

/// The persisted month: one record per calendar date, kept in date order.
pub type HistoryRecord = BTreeMap<NaiveDate, DayRecord>;

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    year: i32,
    month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            bail!("Invalid month {} for year {}", month, year);
        }
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            bail!("Year {} is out of range", year);
        }
        Ok(Self { year, month })
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Parses the `YYYY-MM` form produced by `Display`.
    pub fn parse(label: &str) -> Result<Self> {
        let (year, month) = label
            .split_once('-')
            .ok_or_else(|| anyhow::anyhow!("Expected YYYY-MM, got '{}'", label))?;
        let year: i32 = year
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid year in '{}'", label))?;
        let month: u32 = month
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid month in '{}'", label))?;
        Self::new(year, month)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn last_day(&self) -> NaiveDate {
        let (year, month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|next| next.pred_opt())
            .unwrap_or(NaiveDate::MAX)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActualSample {
    total: f64,
    #[serde(default)]
    models: ModelBreakdown,
}

impl ActualSample {
    pub fn new(total: f64, models: ModelBreakdown) -> Self {
        Self { total, models }
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn models(&self) -> &ModelBreakdown {
        &self.models
    }
}

/// One day of the month-scoped history.
///
/// Fields this crate does not know about are carried in `extra` so that a
/// load/save cycle never drops data another writer put there.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(default)]
    pub planned: f64,
    #[serde(default)]
    pub actual: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelBreakdown>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DayRecord {
    pub fn planned_only(planned: f64) -> Self {
        Self {
            planned,
            actual: 0.0,
            models: None,
            last_update: None,
            extra: Map::new(),
        }
    }

    pub fn is_observed(&self) -> bool {
        self.last_update.is_some()
    }
}

/// The form written to disk: the history plus a small header for consumers
/// that only want the latest figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEnvelope {
    pub last_updated: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_actual: Option<f64>,
    pub data: HistoryRecord,
}

impl HistoryEnvelope {
    pub fn wrap(data: HistoryRecord, last_updated: DateTime<Utc>) -> Self {
        let last_actual = data
            .values()
            .rev()
            .find(|record| record.is_observed())
            .map(|record| record.actual);

        Self {
            last_updated,
            last_actual,
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatestPointer {
    pub year: String,
    pub month: String,
}

impl LatestPointer {
    pub fn for_month(key: MonthKey) -> Self {
        Self {
            year: format!("{:04}", key.year()),
            month: key.to_string(),
        }
    }

    pub fn month_key(&self) -> Result<MonthKey> {
        MonthKey::parse(&self.month)
    }
}

/// What the usage source reported for a single run.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageReport {
    date: NaiveDate,
    sample: ActualSample,
    limit: Option<f64>,
}

impl UsageReport {
    pub fn new(date: NaiveDate, sample: ActualSample, limit: Option<f64>) -> Self {
        Self {
            date,
            sample,
            limit,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sample(&self) -> &ActualSample {
        &self.sample
    }

    pub fn limit(&self) -> Option<f64> {
        self.limit
    }

    pub fn into_samples(self) -> ActualSamples {
        let mut samples = ActualSamples::new();
        samples.insert(self.date, self.sample);
        samples
    }
}
