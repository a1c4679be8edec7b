use crate::data_structures::{ActualSamples, DayRecord, HistoryRecord, PlannedSeries};
use chrono::{DateTime, Utc};

/// Folds a run's planned and actual figures into the month history.
///
/// Only the fields supplied by the inputs are written. Dates missing from
/// either input keep whatever the history already held for them.
pub struct Reconciler;

impl Reconciler {
    pub fn new() -> Self {
        Self
    }

    pub fn merge(
        &self,
        mut history: HistoryRecord,
        planned: &PlannedSeries,
        actual: &ActualSamples,
        timestamp: DateTime<Utc>,
    ) -> HistoryRecord {
        self.merge_planned(&mut history, planned);
        self.merge_actual(&mut history, actual, timestamp);
        history
    }

    fn merge_planned(&self, history: &mut HistoryRecord, planned: &PlannedSeries) {
        for (date, value) in planned {
            history
                .entry(*date)
                .and_modify(|record| record.planned = *value)
                .or_insert_with(|| DayRecord::planned_only(*value));
        }
    }

    fn merge_actual(
        &self,
        history: &mut HistoryRecord,
        actual: &ActualSamples,
        timestamp: DateTime<Utc>,
    ) {
        for (date, sample) in actual {
            let record = history
                .entry(*date)
                .or_insert_with(|| DayRecord::planned_only(0.0));
            record.actual = sample.total();
            record.models = Some(sample.models().clone());
            record.last_update = Some(timestamp);
        }
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::OverrideTable;
    use crate::data_structures::{ActualSample, ModelBreakdown};
    use crate::planner::Planner;
    use chrono::{NaiveDate, TimeZone};
    use serde_json::Value;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn june_plan() -> PlannedSeries {
        Planner::new().plan(300.0, date(2024, 6, 1), date(2024, 6, 30), &OverrideTable::new())
    }

    fn gpt_sample(total: f64) -> ActualSamples {
        let mut models = ModelBreakdown::new();
        models.insert("gpt".to_string(), total);
        let mut samples = ActualSamples::new();
        samples.insert(date(2024, 6, 5), ActualSample::new(total, models));
        samples
    }

    #[test]
    fn test_merge_into_empty_history() {
        let reconciler = Reconciler::new();
        let planned = june_plan();
        let t = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();

        let history = reconciler.merge(HistoryRecord::new(), &planned, &gpt_sample(42.0), t);

        assert_eq!(history.len(), 30);
        let day = &history[&date(2024, 6, 5)];
        assert_eq!(day.planned, planned[&date(2024, 6, 5)]);
        assert_eq!(day.actual, 42.0);
        assert_eq!(day.models.as_ref().unwrap()["gpt"], 42.0);
        assert_eq!(day.last_update, Some(t));

        let untouched = &history[&date(2024, 6, 6)];
        assert_eq!(untouched.actual, 0.0);
        assert!(untouched.models.is_none());
        assert!(untouched.last_update.is_none());
    }

    #[test]
    fn test_empty_actual_leaves_observed_fields_alone() {
        let reconciler = Reconciler::new();
        let t1 = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 6, 6, 9, 0, 0).unwrap();

        let mut before = reconciler.merge(HistoryRecord::new(), &june_plan(), &gpt_sample(42.0), t1);
        before
            .get_mut(&date(2024, 6, 5))
            .unwrap()
            .extra
            .insert("note".to_string(), Value::from("kept"));

        let replanned =
            Planner::new().plan(400.0, date(2024, 6, 1), date(2024, 6, 30), &OverrideTable::new());
        let after = reconciler.merge(before.clone(), &replanned, &ActualSamples::new(), t2);

        for (day, old) in &before {
            let new = &after[day];
            assert_eq!(new.actual, old.actual);
            assert_eq!(new.models, old.models);
            assert_eq!(new.last_update, old.last_update);
            assert_eq!(new.extra, old.extra);
            assert_eq!(new.planned, replanned[day]);
        }
    }

    #[test]
    fn test_merge_is_idempotent_apart_from_stamps() {
        let reconciler = Reconciler::new();
        let planned = june_plan();
        let actual = gpt_sample(42.0);
        let t1 = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 6, 5, 10, 0, 0).unwrap();

        let once = reconciler.merge(HistoryRecord::new(), &planned, &actual, t1);
        let twice = reconciler.merge(once.clone(), &planned, &actual, t2);

        assert_eq!(once.len(), twice.len());
        for (day, first) in &once {
            let second = &twice[day];
            assert_eq!(first.planned, second.planned);
            assert_eq!(first.actual, second.actual);
            assert_eq!(first.models, second.models);
        }
        assert_eq!(twice[&date(2024, 6, 5)].last_update, Some(t2));
    }

    #[test]
    fn test_actual_outside_plan_gets_zero_planned() {
        let reconciler = Reconciler::new();
        let t = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();

        let history = reconciler.merge(
            HistoryRecord::new(),
            &PlannedSeries::new(),
            &gpt_sample(10.0),
            t,
        );

        assert_eq!(history.len(), 1);
        let day = &history[&date(2024, 6, 5)];
        assert_eq!(day.planned, 0.0);
        assert_eq!(day.actual, 10.0);
    }

    #[test]
    fn test_history_entries_outside_plan_survive() {
        let reconciler = Reconciler::new();
        let t = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();
        let mut history = HistoryRecord::new();
        history.insert(
            date(2024, 5, 31),
            DayRecord {
                actual: 280.0,
                ..DayRecord::planned_only(300.0)
            },
        );

        let merged = reconciler.merge(history, &june_plan(), &ActualSamples::new(), t);
        assert_eq!(merged[&date(2024, 5, 31)].actual, 280.0);
        assert_eq!(merged.keys().next(), Some(&date(2024, 5, 31)));
    }
}
