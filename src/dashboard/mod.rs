//! Dashboard event sinks.
//!
//! Every planned metric ends up as a [`DashboardEvent`] handed to an
//! [`EventSink`]. Delivery is fire-and-forget: the run logs and counts a
//! failed emit but never retries it.
//!
//! ## Available sinks
//!
//! - **HttpSink**: Dashing-compatible widget push (`POST <url>/widgets/<name>`)
//! - **LogSink**: writes each event to the log (default)
//! - **EventBus** ([`crate::events`]): in-process broadcast for embedders
//!
//! ## Configuration
//!
//! ```toml
//! [dashboard]
//! type = "http"
//! url = "http://localhost:3030"
//! auth_token = "${DASHING_AUTH_TOKEN}"
//! ```

mod http;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
pub use http::HttpSink;

use crate::{config::DashboardConfig, widgets::Payload};

/// A named payload ready for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardEvent {
    pub name: String,
    pub payload: Payload,
    pub emitted_at: DateTime<Utc>,
}

impl DashboardEvent {
    pub fn new(name: impl Into<String>, payload: Payload) -> Self {
        Self {
            name: name.into(),
            payload,
            emitted_at: Utc::now(),
        }
    }
}

/// Errors from event sinks.
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("dashboard request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("dashboard rejected event with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Destination for dashboard events.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn emit(&self, event: &DashboardEvent) -> Result<(), SinkError>;

    /// Sink name for logging.
    fn name(&self) -> &'static str;
}

// ─────────────────────────────────────────────────────────────────────────────
// Log Sink
// ─────────────────────────────────────────────────────────────────────────────

/// Sink that writes every event to the log at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl EventSink for LogSink {
    async fn emit(&self, event: &DashboardEvent) -> Result<(), SinkError> {
        let payload = serde_json::to_string(&event.payload).unwrap_or_default();
        tracing::info!(
            event = %event.name,
            payload = %payload,
            emitted_at = %event.emitted_at,
            "Dashboard event"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "log"
    }
}

/// Build the sink selected by the `[dashboard]` section.
pub fn build_sink(config: &DashboardConfig, http: reqwest::Client) -> Arc<dyn EventSink> {
    match config {
        DashboardConfig::Log => Arc::new(LogSink),
        DashboardConfig::Http(http_config) => Arc::new(HttpSink::new(http_config, http)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HttpDashboardConfig;

    #[tokio::test]
    async fn test_log_sink_accepts_every_event() {
        let sink = LogSink;
        sink.emit(&DashboardEvent::new("ga_sessions", Payload::count(7)))
            .await
            .unwrap();
        assert_eq!(sink.name(), "log");
    }

    #[test]
    fn test_build_sink_selects_log_by_default() {
        let sink = build_sink(&DashboardConfig::default(), reqwest::Client::new());
        assert_eq!(sink.name(), "log");
    }

    #[test]
    fn test_build_sink_selects_http() {
        let config = DashboardConfig::Http(HttpDashboardConfig {
            url: "http://localhost:3030".into(),
            auth_token: None,
            timeout_secs: 5,
        });
        let sink = build_sink(&config, reqwest::Client::new());
        assert_eq!(sink.name(), "http");
    }
}
