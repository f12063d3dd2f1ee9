//! Periodic Google Analytics to dashboard widget feeder.
//!
//! A run authenticates with a service account, queries a fixed plan of
//! reporting metrics for one view, reshapes each result into a widget
//! payload and emits it to a dashboard sink. [`jobs`] schedules runs.

pub mod analytics;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod events;
pub mod jobs;
pub mod observability;
pub mod widgets;

#[cfg(test)]
mod test_utils;
#[cfg(test)]
mod tests;
