//! TUI widget modules

pub mod burn_chart;
pub mod header;
pub mod history_popup;
pub mod popup;
pub mod predictions;
pub mod progress_bars;
pub mod shortcuts;
pub mod statistics;

pub use burn_chart::*;
pub use header::*;
pub use history_popup::*;
pub use popup::*;
pub use predictions::*;
pub use progress_bars::*;
pub use shortcuts::*;
pub use statistics::*;
