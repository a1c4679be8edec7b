use crate::data_structures::{round2, HistoryRecord, ModelBreakdown};
use chrono::NaiveDate;

/// Planned-versus-actual figures for one month, as of a given day.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    target: f64,
    planned_today: f64,
    observed: Option<Observation>,
    recent_daily_usage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub date: NaiveDate,
    pub actual: f64,
    pub planned: f64,
    pub models: ModelBreakdown,
}

impl MonthSummary {
    pub fn target(&self) -> f64 {
        self.target
    }

    pub fn planned_today(&self) -> f64 {
        self.planned_today
    }

    pub fn observed(&self) -> Option<&Observation> {
        self.observed.as_ref()
    }

    pub fn actual(&self) -> f64 {
        self.observed.as_ref().map_or(0.0, |o| o.actual)
    }

    /// Positive when usage runs ahead of plan at the last observation.
    pub fn variance(&self) -> Option<f64> {
        self.observed
            .as_ref()
            .map(|o| round2(o.actual - o.planned))
    }

    pub fn usage_percentage(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (self.actual() / self.target) * 100.0
    }

    pub fn planned_percentage(&self) -> f64 {
        if self.target <= 0.0 {
            return 0.0;
        }
        (self.planned_today / self.target) * 100.0
    }

    /// Month-end usage if consumption keeps its current ratio to the plan.
    pub fn projected_month_end(&self) -> Option<f64> {
        let observed = self.observed.as_ref()?;
        if observed.planned <= 0.0 {
            return None;
        }
        Some(round2(observed.actual / observed.planned * self.target))
    }

    pub fn recent_daily_usage(&self) -> Option<f64> {
        self.recent_daily_usage
    }

    pub fn remaining(&self) -> f64 {
        round2(self.target - self.actual())
    }
}

pub struct Calculator;

impl Calculator {
    pub fn new() -> Self {
        Self
    }

    /// Summarises `history` as seen on `today`. `None` for an empty month.
    pub fn summarize(&self, history: &HistoryRecord, today: NaiveDate) -> Option<MonthSummary> {
        if history.is_empty() {
            return None;
        }
        let target = history.values().map(|r| r.planned).fold(0.0, f64::max);

        let planned_today = history
            .range(..=today)
            .next_back()
            .map_or(0.0, |(_, record)| record.planned);

        let mut observations = history
            .iter()
            .rev()
            .filter(|(date, record)| **date <= today && record.is_observed());

        let observed = observations.next().map(|(date, record)| Observation {
            date: *date,
            actual: record.actual,
            planned: record.planned,
            models: record.models.clone().unwrap_or_default(),
        });

        let recent_daily_usage = match (&observed, observations.next()) {
            (Some(latest), Some((prev_date, prev))) => {
                let days = (latest.date - *prev_date).num_days();
                (days > 0).then(|| round2((latest.actual - prev.actual) / days as f64))
            }
            _ => None,
        };

        Some(MonthSummary {
            target,
            planned_today,
            observed,
            recent_daily_usage,
        })
    }

    /// `(date, planned, actual)` points for charting; `actual` is `None` on
    /// days that were never observed.
    pub fn burn_points(&self, history: &HistoryRecord) -> Vec<(NaiveDate, f64, Option<f64>)> {
        history
            .iter()
            .map(|(date, record)| {
                let actual = record.is_observed().then_some(record.actual);
                (*date, record.planned, actual)
            })
            .collect()
    }
}

impl Default for Calculator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::OverrideTable;
    use crate::data_structures::{ActualSample, ActualSamples};
    use crate::planner::Planner;
    use crate::reconciler::Reconciler;
    use chrono::{TimeZone, Utc};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn june_history(samples: &[(u32, f64)]) -> HistoryRecord {
        let planned = Planner::new().plan(300.0, date(1), date(30), &OverrideTable::new());
        let mut actual = ActualSamples::new();
        for (day, total) in samples {
            actual.insert(date(*day), ActualSample::new(*total, Default::default()));
        }
        let t = Utc.with_ymd_and_hms(2024, 6, 14, 9, 0, 0).unwrap();
        Reconciler::new().merge(HistoryRecord::new(), &planned, &actual, t)
    }

    #[test]
    fn test_empty_history_has_no_summary() {
        let calculator = Calculator::new();
        assert!(calculator.summarize(&HistoryRecord::new(), date(5)).is_none());
    }

    #[test]
    fn test_summary_ahead_of_plan() {
        let calculator = Calculator::new();
        let history = june_history(&[(12, 120.0), (14, 180.0)]);

        let summary = calculator.summarize(&history, date(14)).unwrap();
        assert_eq!(summary.target(), 300.0);
        assert_eq!(summary.planned_today(), 150.0);
        assert_eq!(summary.actual(), 180.0);
        assert_eq!(summary.variance(), Some(30.0));
        assert_eq!(summary.usage_percentage(), 60.0);
        assert_eq!(summary.projected_month_end(), Some(360.0));
        assert_eq!(summary.recent_daily_usage(), Some(30.0));
        assert_eq!(summary.remaining(), 120.0);
    }

    #[test]
    fn test_summary_ignores_future_observations() {
        let calculator = Calculator::new();
        let history = june_history(&[(5, 40.0), (20, 200.0)]);

        let summary = calculator.summarize(&history, date(10)).unwrap();
        assert_eq!(summary.observed().unwrap().date, date(5));
        assert_eq!(summary.recent_daily_usage(), None);
    }

    #[test]
    fn test_projection_needs_nonzero_plan() {
        let calculator = Calculator::new();
        // June 1st is a Saturday, so nothing is planned yet.
        let history = june_history(&[(1, 5.0)]);

        let summary = calculator.summarize(&history, date(1)).unwrap();
        assert_eq!(summary.planned_today(), 0.0);
        assert_eq!(summary.projected_month_end(), None);
    }

    #[test]
    fn test_burn_points_mark_unobserved_days() {
        let calculator = Calculator::new();
        let history = june_history(&[(3, 10.0)]);

        let points = calculator.burn_points(&history);
        assert_eq!(points.len(), 30);
        assert_eq!(points[2], (date(3), 15.0, Some(10.0)));
        assert_eq!(points[3].2, None);
    }
}
