//! Pipeline entry points for the alert job.
//!
//! - `calculate_diff`: which crawled posts were not seen last run
//! - `run_alert`: crawl, diff, persist, notify

pub mod diff;
pub mod run;

pub use diff::calculate_diff;
pub use run::{RunOptions, RunSummary, run_alert};
