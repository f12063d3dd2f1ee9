//! Google Analytics Core Reporting API access.
//!
//! Queries are addressed by view id and date window and return raw tabular
//! rows; turning those rows into widget payloads is the job of
//! [`crate::widgets`].

mod client;
mod query;
mod window;

pub use client::{AnalyticsApi, AnalyticsError, ReportingClient};
pub use query::{MetricQuery, QueryResult, ReportRequest};
pub use window::DateWindow;
