pub mod calculator;
pub mod calendar;
pub mod config;
pub mod data_structures;
pub mod error;
pub mod monitor;
pub mod planner;
pub mod reconciler;
pub mod sources;
pub mod store;

pub use calculator::{Calculator, MonthSummary};
pub use calendar::{is_working_day, DayOverride, OverrideTable, YearOverrides};
pub use config::Settings;
pub use data_structures::{
    ActualSample, ActualSamples, DayRecord, HistoryEnvelope, HistoryRecord, LatestPointer,
    ModelBreakdown, MonthKey, PlannedSeries, UsageReport,
};
pub use error::SourceError;
pub use monitor::{UpdateSummary, UsageMonitor};
pub use planner::Planner;
pub use reconciler::Reconciler;
pub use store::HistoryStore;

pub use anyhow::Result;
pub use chrono::{DateTime, NaiveDate, Utc};

pub mod prelude {
    pub use crate::calendar::OverrideTable;
    pub use crate::data_structures::{HistoryRecord, MonthKey};
    pub use crate::monitor::UsageMonitor;
    pub use crate::planner::Planner;
    pub use crate::reconciler::Reconciler;
    pub use anyhow::Result;
    pub use chrono::{DateTime, NaiveDate, Utc};
}
