use crate::calculator::{Calculator, MonthSummary};
use crate::calendar::OverrideTable;
use crate::config::Settings;
use crate::data_structures::{HistoryRecord, MonthKey};
use crate::planner::Planner;
use crate::reconciler::Reconciler;
use crate::sources::{CalendarSource, UsageSource};
use crate::store::HistoryStore;
use anyhow::Result;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use std::path::PathBuf;

/// What a single `update` run did.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSummary {
    pub month: MonthKey,
    pub target: f64,
    pub planned_days: usize,
    pub actual_merged: bool,
    pub records: usize,
    pub path: PathBuf,
}

/// Ties the planner, reconciler and store together for one month-scoped run.
pub struct UsageMonitor {
    settings: Settings,
    env_target: Option<String>,
    store: HistoryStore,
    planner: Planner,
    reconciler: Reconciler,
    calculator: Calculator,
}

impl UsageMonitor {
    pub fn new(settings: Settings) -> Self {
        let store = HistoryStore::new(settings.data_dir.clone());
        Self {
            settings,
            env_target: None,
            store,
            planner: Planner::new(),
            reconciler: Reconciler::new(),
            calculator: Calculator::new(),
        }
    }

    /// Raw value of the target override from the environment, if any.
    pub fn with_env_target(mut self, env_target: Option<String>) -> Self {
        self.env_target = env_target;
        self
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Fetches, plans, merges and persists the month containing `today`.
    ///
    /// Either collaborator may fail without stopping the run; only writing
    /// the history or the latest pointer is fatal.
    pub async fn update<C, U>(
        &self,
        today: NaiveDate,
        now: DateTime<Utc>,
        calendar: &C,
        usage: &U,
    ) -> Result<UpdateSummary>
    where
        C: CalendarSource + ?Sized,
        U: UsageSource + ?Sized,
    {
        let month = MonthKey::from_date(today);

        let mut overrides = OverrideTable::new();
        match calendar.fetch_year(today.year()).await {
            Ok(year) => {
                if year.is_empty() {
                    tracing::warn!("Calendar for {} has no entries; using weekends only", today.year());
                } else {
                    tracing::debug!("Loaded {} calendar overrides for {}", year.len(), today.year());
                }
                overrides.insert_year(today.year(), year);
            }
            Err(e) => tracing::warn!(
                "Failed to fetch holidays for {}: {}; using weekends only",
                today.year(),
                e
            ),
        }

        let report = match usage.fetch_usage(today).await {
            Ok(Some(report)) if !month.contains(report.date()) => {
                tracing::warn!(
                    "Ignoring usage dated {}, outside of {}",
                    report.date(),
                    month
                );
                None
            }
            Ok(report) => report,
            Err(e) => {
                tracing::warn!("Error fetching actual usage: {}", e);
                None
            }
        };

        let fetched_limit = report.as_ref().and_then(|r| r.limit());
        if let Some(limit) = fetched_limit {
            tracing::info!("Using quota limit reported by the usage source: {}", limit);
        }
        let target = self
            .settings
            .resolve_target(fetched_limit, self.env_target.as_deref());

        let planned = self
            .planner
            .plan(target, month.first_day(), month.last_day(), &overrides);
        if planned.is_empty() {
            tracing::warn!("No working days in {}, planned values left unchanged", month);
        }

        let actual = report.map(|r| r.into_samples()).unwrap_or_default();
        let actual_merged = !actual.is_empty();

        let history = self.store.load(month);
        let history = self.reconciler.merge(history, &planned, &actual, now);

        let path = self.store.save(month, &history, now)?;
        self.store.write_latest(month)?;

        Ok(UpdateSummary {
            month,
            target,
            planned_days: planned.len(),
            actual_merged,
            records: history.len(),
            path,
        })
    }

    pub fn load_month(&self, month: MonthKey) -> HistoryRecord {
        self.store.load(month)
    }

    /// Month named by the latest pointer, or the month containing `today`.
    pub fn current_month(&self, today: NaiveDate) -> MonthKey {
        self.store
            .read_latest()
            .unwrap_or_else(|| MonthKey::from_date(today))
    }

    pub fn summarize(&self, history: &HistoryRecord, today: NaiveDate) -> Option<MonthSummary> {
        self.calculator.summarize(history, today)
    }

    pub fn calculator(&self) -> &Calculator {
        &self.calculator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{DayOverride, YearOverrides};
    use crate::data_structures::{ActualSample, ModelBreakdown, UsageReport};
    use crate::sources::{StaticCalendar, StaticUsage};
    use chrono::TimeZone;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn monitor_in(dir: &std::path::Path) -> UsageMonitor {
        UsageMonitor::new(Settings {
            data_dir: dir.to_path_buf(),
            ..Settings::default()
        })
    }

    fn report(day: u32, total: f64, limit: Option<f64>) -> UsageReport {
        let mut models = ModelBreakdown::new();
        models.insert("gpt".to_string(), total);
        UsageReport::new(date(day), ActualSample::new(total, models), limit)
    }

    #[tokio::test]
    async fn test_update_plans_and_merges() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_in(dir.path());
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();

        let summary = monitor
            .update(
                date(5),
                now,
                &StaticCalendar::new(),
                &StaticUsage::new(Some(report(5, 42.0, None))),
            )
            .await
            .unwrap();

        assert_eq!(summary.month, MonthKey::new(2024, 6).unwrap());
        assert_eq!(summary.target, 300.0);
        assert_eq!(summary.planned_days, 30);
        assert!(summary.actual_merged);
        assert!(summary.path.exists());

        let history = monitor.load_month(summary.month);
        let day = &history[&date(5)];
        assert_eq!(day.planned, 45.0);
        assert_eq!(day.actual, 42.0);
        assert_eq!(day.models.as_ref().unwrap()["gpt"], 42.0);
        assert_eq!(monitor.current_month(date(20)), summary.month);
    }

    #[tokio::test]
    async fn test_failed_usage_keeps_actuals_and_updates_plan() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_in(dir.path());
        let t1 = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();
        let t2 = Utc.with_ymd_and_hms(2024, 6, 6, 9, 0, 0).unwrap();

        monitor
            .update(
                date(5),
                t1,
                &StaticCalendar::new(),
                &StaticUsage::new(Some(report(5, 42.0, None))),
            )
            .await
            .unwrap();
        let before = monitor.load_month(MonthKey::new(2024, 6).unwrap());

        let monitor = monitor.with_env_target(Some("600".to_string()));
        let summary = monitor
            .update(date(6), t2, &StaticCalendar::new(), &StaticUsage::failing(500))
            .await
            .unwrap();
        assert!(!summary.actual_merged);
        assert_eq!(summary.target, 600.0);

        let after = monitor.load_month(summary.month);
        for (day, old) in &before {
            let new = &after[day];
            assert_eq!(new.actual, old.actual);
            assert_eq!(new.models, old.models);
            assert_eq!(new.last_update, old.last_update);
        }
        assert_eq!(after[&date(5)].planned, 90.0);
    }

    #[tokio::test]
    async fn test_fetched_limit_and_calendar_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_in(dir.path());
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();

        let calendar = StaticCalendar::new().with_year(
            2024,
            YearOverrides::from_days(vec![DayOverride {
                name: "Dragon Boat Festival".to_string(),
                date: date(10),
                is_off_day: true,
            }]),
        );

        let summary = monitor
            .update(
                date(5),
                now,
                &calendar,
                &StaticUsage::new(Some(report(5, 10.0, Some(190.0)))),
            )
            .await
            .unwrap();
        assert_eq!(summary.target, 190.0);

        // 19 working days at 10.0 each.
        let history = monitor.load_month(summary.month);
        assert_eq!(history[&date(7)].planned, 50.0);
        assert_eq!(history[&date(10)].planned, 50.0);
        assert_eq!(history[&date(30)].planned, 190.0);
    }

    #[tokio::test]
    async fn test_malformed_history_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_in(dir.path());
        let month = MonthKey::new(2024, 6).unwrap();
        let path = monitor.store().month_path(month);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "not json").unwrap();

        let now = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();
        let summary = monitor
            .update(date(5), now, &StaticCalendar::new(), &StaticUsage::new(None))
            .await
            .unwrap();
        assert_eq!(summary.records, 30);
    }

    #[tokio::test]
    async fn test_one_bad_day_does_not_lose_recorded_actuals() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_in(dir.path());
        let month = MonthKey::new(2024, 6).unwrap();
        let path = monitor.store().month_path(month);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            r#"{
  "2024-06-03": {"actual": 12, "models": {"gpt": 12}},
  "2024-06-04": {"actual": 25},
  "2024-06-05": {"actual": null}
}"#,
        )
        .unwrap();

        let now = Utc.with_ymd_and_hms(2024, 6, 6, 9, 0, 0).unwrap();
        monitor
            .update(date(6), now, &StaticCalendar::new(), &StaticUsage::failing(500))
            .await
            .unwrap();

        let history = monitor.load_month(month);
        assert_eq!(history[&date(3)].actual, 12.0);
        assert_eq!(history[&date(3)].models.as_ref().unwrap()["gpt"], 12.0);
        assert_eq!(history[&date(3)].planned, 15.0);
        assert_eq!(history[&date(4)].actual, 25.0);
        assert_eq!(history[&date(5)].actual, 0.0);
        assert!(monitor.store().backup_path(month).exists());
    }

    #[tokio::test]
    async fn test_usage_from_another_month_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let monitor = monitor_in(dir.path());
        let now = Utc.with_ymd_and_hms(2024, 6, 5, 9, 0, 0).unwrap();

        let stale = UsageReport::new(
            NaiveDate::from_ymd_opt(2024, 5, 31).unwrap(),
            ActualSample::new(280.0, ModelBreakdown::new()),
            Some(1000.0),
        );
        let summary = monitor
            .update(date(5), now, &StaticCalendar::new(), &StaticUsage::new(Some(stale)))
            .await
            .unwrap();

        assert!(!summary.actual_merged);
        assert_eq!(summary.target, 300.0);
        let history = monitor.load_month(summary.month);
        assert!(history.values().all(|day| !day.is_observed()));
    }
}
