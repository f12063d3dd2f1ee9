use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Run schedule for the analytics sync worker.
///
/// Runs never overlap: the worker awaits each run before waiting for the next
/// tick, and ticks missed while a run is still going are dropped.
///
/// ```toml
/// [schedule]
/// interval_secs = 3600
/// first_run_delay_secs = 0
/// run_timeout_secs = 3000
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Time between the start of consecutive runs, in seconds.
    /// Default: 3600 (1 hour)
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Delay before the first run, in seconds. Default: 0 (run on startup).
    #[serde(default)]
    pub first_run_delay_secs: u64,

    /// Upper bound on a single run, in seconds. A run that exceeds it is
    /// abandoned. Set to 0 for unlimited.
    /// Default: 3000 (50 minutes)
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            first_run_delay_secs: 0,
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

impl ScheduleConfig {
    /// Get the interval as a Duration.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Get the delay before the first run as a Duration.
    pub fn first_run_delay(&self) -> Duration {
        Duration::from_secs(self.first_run_delay_secs)
    }

    /// Get the run timeout as a Duration, or None if unlimited.
    pub fn run_timeout(&self) -> Option<Duration> {
        if self.run_timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.run_timeout_secs))
        }
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::Validation(
                "schedule.interval_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

fn default_interval_secs() -> u64 {
    3600 // 1 hour
}

fn default_run_timeout_secs() -> u64 {
    3000 // 50 minutes
}
