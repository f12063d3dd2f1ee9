//! Background jobs.
//!
//! - **Analytics Sync**: on a fixed interval, fetches the planned reporting
//!   metrics and pushes them to the dashboard sink.
//!
//! ```toml
//! [schedule]
//! interval_secs = 3600
//! first_run_delay_secs = 0
//! run_timeout_secs = 3000
//!
//! [analytics]
//! goal_ids = [1, 2, 3]
//! ```

mod analytics_sync;
mod plan;

pub use analytics_sync::{
    AnalyticsSync, RunError, RunOutcome, RunSummary, start_analytics_sync_worker,
};
pub use plan::{PlannedMetric, build_plan};
