//! Scheduled analytics sync.
//!
//! Each run fetches one bearer token, executes the plan's queries in order,
//! reshapes every result and emits it to the dashboard sink. The worker
//! drives runs on a fixed interval:
//! - Runs never overlap; ticks missed while a run is in progress are skipped
//! - A run that exceeds `run_timeout_secs` is abandoned
//! - Errors don't stop the worker, the next tick runs normally
//! - An unconfigured authenticator skips every run

use std::{sync::Arc, time::Duration};

use chrono::{Local, NaiveDate};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::plan::{PlannedMetric, build_plan};
use crate::{
    analytics::{AnalyticsApi, AnalyticsError, DateWindow, ReportRequest},
    auth::{AuthError, Authenticator},
    config::{AnalyticsConfig, ScheduleConfig},
    dashboard::{DashboardEvent, EventSink},
    widgets::ReshapeError,
};

/// Counters from a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Queries that returned a result.
    pub queries: usize,
    pub events_emitted: usize,
    /// Events the sink failed to accept.
    pub emit_failures: usize,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Completed(RunSummary),
    /// Credentials are not configured.
    Skipped { reason: String },
}

/// Errors that abort a run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("failed to obtain access token: {0}")]
    Auth(#[from] AuthError),

    #[error("query for '{event}' failed: {source}")]
    Query {
        event: String,
        #[source]
        source: AnalyticsError,
    },

    #[error("result for '{event}' could not be reshaped: {source}")]
    Reshape {
        event: String,
        #[source]
        source: ReshapeError,
    },

    #[error("run exceeded timeout of {0:?}")]
    TimedOut(Duration),
}

/// Everything a run needs, built once at startup.
pub struct AnalyticsSync {
    authenticator: Authenticator,
    api: Arc<dyn AnalyticsApi>,
    sink: Arc<dyn EventSink>,
    plan: Vec<PlannedMetric>,
    window_days: u32,
}

impl AnalyticsSync {
    pub fn new(
        authenticator: Authenticator,
        api: Arc<dyn AnalyticsApi>,
        sink: Arc<dyn EventSink>,
        config: &AnalyticsConfig,
    ) -> Self {
        Self {
            authenticator,
            api,
            sink,
            plan: build_plan(&config.goal_ids),
            window_days: config.window_days,
        }
    }

    pub fn plan(&self) -> &[PlannedMetric] {
        &self.plan
    }

    /// Execute one run for the window ending the day before `today`.
    pub async fn run_once(&self, today: NaiveDate) -> Result<RunOutcome, RunError> {
        let (tokens, view_id) = match &self.authenticator {
            Authenticator::Ready { tokens, view_id } => (tokens, view_id.as_str()),
            Authenticator::Unconfigured { reason } => {
                tracing::debug!(
                    reason = %reason,
                    "Analytics credentials not configured, skipping run"
                );
                return Ok(RunOutcome::Skipped {
                    reason: reason.clone(),
                });
            }
        };

        let start = std::time::Instant::now();
        let token = tokens.fetch_access_token().await?;

        let window = DateWindow::ending_yesterday(today, self.window_days);
        let moreinfo = format!("Chart: {}", window.display());
        let mut summary = RunSummary::default();

        for metric in &self.plan {
            let request = ReportRequest {
                view_id,
                window: &window,
                query: &metric.query,
            };

            let result = self
                .api
                .query(&token, &request)
                .await
                .map_err(|source| RunError::Query {
                    event: metric.event_name.clone(),
                    source,
                })?;
            summary.queries += 1;

            let payload = metric
                .shape
                .reshape(&result, &moreinfo)
                .map_err(|source| RunError::Reshape {
                    event: metric.event_name.clone(),
                    source,
                })?;

            let event = DashboardEvent::new(metric.event_name.as_str(), payload);
            match self.sink.emit(&event).await {
                Ok(()) => summary.events_emitted += 1,
                Err(e) => {
                    summary.emit_failures += 1;
                    tracing::warn!(
                        event = %metric.event_name,
                        sink = self.sink.name(),
                        error = %e,
                        "Failed to emit dashboard event"
                    );
                }
            }
        }

        summary.duration_ms = start.elapsed().as_millis() as u64;
        Ok(RunOutcome::Completed(summary))
    }

    /// [`run_once`](Self::run_once) bounded by `timeout`, if any.
    pub async fn run_with_timeout(
        &self,
        today: NaiveDate,
        timeout: Option<Duration>,
    ) -> Result<RunOutcome, RunError> {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, self.run_once(today))
                .await
                .map_err(|_| RunError::TimedOut(limit))?,
            None => self.run_once(today).await,
        }
    }
}

/// Starts the analytics sync worker.
///
/// Runs until `cancel` is cancelled. The first run happens after
/// `first_run_delay_secs`, then every `interval_secs`.
pub async fn start_analytics_sync_worker(
    sync: AnalyticsSync,
    schedule: ScheduleConfig,
    cancel: CancellationToken,
) {
    tracing::info!(
        interval_secs = schedule.interval_secs,
        first_run_delay_secs = schedule.first_run_delay_secs,
        run_timeout_secs = schedule.run_timeout_secs,
        queries = sync.plan().len(),
        "Starting analytics sync worker"
    );

    let sync = &sync;
    let run_timeout = schedule.run_timeout();
    run_on_schedule(&schedule, &cancel, move || async move {
        let today = Local::now().date_naive();
        log_run(sync.run_with_timeout(today, run_timeout).await);
    })
    .await;

    tracing::info!("Analytics sync worker stopped");
}

/// Call `run` on the schedule until `cancel` fires.
///
/// Each run is awaited before the next tick; ticks that pass during a run
/// are skipped rather than queued.
async fn run_on_schedule<F, Fut>(
    schedule: &ScheduleConfig,
    cancel: &CancellationToken,
    mut run: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    let mut ticker =
        tokio::time::interval_at(Instant::now() + schedule.first_run_delay(), schedule.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Analytics sync cancelled mid-run");
                break;
            }
            _ = run() => {}
        }
    }
}

fn log_run(result: Result<RunOutcome, RunError>) {
    match result {
        Ok(RunOutcome::Completed(summary)) => {
            if summary.emit_failures > 0 {
                tracing::warn!(
                    queries = summary.queries,
                    events_emitted = summary.events_emitted,
                    emit_failures = summary.emit_failures,
                    duration_ms = summary.duration_ms,
                    "Analytics sync completed with emit failures"
                );
            } else {
                tracing::info!(
                    queries = summary.queries,
                    events_emitted = summary.events_emitted,
                    duration_ms = summary.duration_ms,
                    "Analytics sync complete"
                );
            }
        }
        Ok(RunOutcome::Skipped { .. }) => {}
        Err(e) => {
            tracing::error!(error = %e, "Analytics sync failed, will retry next interval");
        }
    }
}
