use crate::calendar::{is_working_day, OverrideTable};
use crate::data_structures::{round2, PlannedSeries};
use chrono::NaiveDate;

/// Spreads a quota evenly over the working days of a date range.
pub struct Planner;

impl Planner {
    pub fn new() -> Self {
        Self
    }

    /// Cumulative planned value for every date in `[start, end]`.
    ///
    /// Returns an empty series when the range holds no working day, or when
    /// `start` is after `end`. Non-working days repeat the previous value.
    pub fn plan(
        &self,
        target: f64,
        start: NaiveDate,
        end: NaiveDate,
        overrides: &OverrideTable,
    ) -> PlannedSeries {
        let days: Vec<(NaiveDate, bool)> = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| (date, is_working_day(date, overrides)))
            .collect();

        let working_days = days.iter().filter(|(_, working)| *working).count();
        if working_days == 0 {
            return PlannedSeries::new();
        }

        let increment = target / working_days as f64;
        let mut cumulative = 0.0;
        let mut planned = PlannedSeries::new();

        for (date, working) in days {
            if working {
                cumulative += increment;
            }
            planned.insert(date, round2(cumulative));
        }

        planned
    }

    pub fn count_working_days(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        overrides: &OverrideTable,
    ) -> usize {
        start
            .iter_days()
            .take_while(|date| *date <= end)
            .filter(|date| is_working_day(*date, overrides))
            .count()
    }
}

impl Default for Planner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{DayOverride, YearOverrides};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_june_2024_even_split() {
        // June 2024: 30 days, 20 weekdays, starts on a Saturday.
        let planner = Planner::new();
        let table = OverrideTable::new();
        let planned = planner.plan(300.0, date(2024, 6, 1), date(2024, 6, 30), &table);

        assert_eq!(planned.len(), 30);
        assert_eq!(planned[&date(2024, 6, 1)], 0.0);
        assert_eq!(planned[&date(2024, 6, 2)], 0.0);
        assert_eq!(planned[&date(2024, 6, 3)], 15.0);
        // Tenth working day is Friday the 14th.
        assert_eq!(planned[&date(2024, 6, 14)], 150.0);
        assert_eq!(planned[&date(2024, 6, 15)], 150.0);
        assert_eq!(planned[&date(2024, 6, 28)], 300.0);
        assert_eq!(planned[&date(2024, 6, 29)], 300.0);
        assert_eq!(planned[&date(2024, 6, 30)], 300.0);
    }

    #[test]
    fn test_series_is_non_decreasing_and_hits_target() {
        let planner = Planner::new();
        let table = OverrideTable::new();

        for target in [0.0, 1.0, 7.0, 100.0, 299.99, 1234.56] {
            let planned = planner.plan(target, date(2024, 1, 1), date(2024, 1, 31), &table);
            let values: Vec<f64> = planned.values().copied().collect();
            assert!(values.windows(2).all(|w| w[0] <= w[1]));

            let last = *planned.values().last().unwrap();
            assert!((last - target).abs() <= 0.01, "target {} ended at {}", target, last);
        }
    }

    #[test]
    fn test_no_working_days_yields_empty_series() {
        let planner = Planner::new();
        let table = OverrideTable::new();
        // Saturday and Sunday only.
        let planned = planner.plan(300.0, date(2024, 6, 1), date(2024, 6, 2), &table);
        assert!(planned.is_empty());
    }

    #[test]
    fn test_inverted_range_yields_empty_series() {
        let planner = Planner::new();
        let planned = planner.plan(
            300.0,
            date(2024, 6, 10),
            date(2024, 6, 3),
            &OverrideTable::new(),
        );
        assert!(planned.is_empty());
    }

    #[test]
    fn test_overrides_shift_the_increment() {
        let planner = Planner::new();
        let mut table = OverrideTable::new();
        table.insert_year(
            2024,
            YearOverrides::from_days(vec![
                DayOverride {
                    name: "Holiday".to_string(),
                    date: date(2024, 6, 10),
                    is_off_day: true,
                },
                DayOverride {
                    name: "Make-up day".to_string(),
                    date: date(2024, 6, 15),
                    is_off_day: false,
                },
            ]),
        );

        // Still 20 working days: one weekday removed, one Saturday added.
        assert_eq!(
            planner.count_working_days(date(2024, 6, 1), date(2024, 6, 30), &table),
            20
        );

        let planned = planner.plan(300.0, date(2024, 6, 1), date(2024, 6, 30), &table);
        assert_eq!(planned[&date(2024, 6, 10)], planned[&date(2024, 6, 9)]);
        assert_eq!(planned[&date(2024, 6, 15)], planned[&date(2024, 6, 14)] + 15.0);
        assert_eq!(planned[&date(2024, 6, 30)], 300.0);
    }

    #[test]
    fn test_rounding_is_applied_after_accumulation() {
        let planner = Planner::new();
        let table = OverrideTable::new();
        // Three weekdays: 2024-06-03..05. 100 / 3 = 33.333...
        let planned = planner.plan(100.0, date(2024, 6, 3), date(2024, 6, 5), &table);
        assert_eq!(planned[&date(2024, 6, 3)], 33.33);
        assert_eq!(planned[&date(2024, 6, 4)], 66.67);
        assert_eq!(planned[&date(2024, 6, 5)], 100.0);
    }
}
