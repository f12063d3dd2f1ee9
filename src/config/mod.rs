//! Configuration module for the dashboard feeder.
//!
//! The feeder runs with sensible defaults and no config file at all. A TOML
//! file can override any section, with support for environment variable
//! interpolation using `${VAR_NAME}` syntax. Service-account credentials are
//! never read from the file; see [`crate::auth::ServiceAccountCredentials`].
//!
//! # Example
//!
//! ```toml
//! [analytics]
//! goal_ids = [1, 2, 3]
//!
//! [schedule]
//! interval_secs = 3600
//!
//! [dashboard]
//! type = "http"
//! url = "http://localhost:3030"
//! auth_token = "${DASHING_AUTH_TOKEN}"
//! ```

mod analytics;
mod dashboard;
mod observability;
mod schedule;

use std::path::Path;

pub use analytics::*;
pub use dashboard::*;
pub use observability::*;
pub use schedule::*;
use serde::{Deserialize, Serialize};

/// Root configuration for the feeder.
///
/// All sections are optional with defaults matching the stock hourly
/// Google Analytics widget set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeederConfig {
    /// Reporting API and token endpoint settings.
    #[serde(default)]
    pub analytics: AnalyticsConfig,

    /// Run schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Where widget events are delivered.
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Logging configuration.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl FeederConfig {
    /// Load configuration from a TOML file.
    ///
    /// Environment variables in the format `${VAR_NAME}` are expanded.
    /// Missing variables will cause an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e, path.as_ref().to_path_buf()))?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(contents: &str) -> Result<Self, ConfigError> {
        let expanded = expand_env_vars(contents)?;
        let config: FeederConfig = toml::from_str(&expanded).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and completeness.
    fn validate(&self) -> Result<(), ConfigError> {
        self.analytics.validate()?;
        self.schedule.validate()?;
        self.dashboard.validate()?;
        Ok(())
    }

    /// Settings that are valid but likely unintended.
    ///
    /// Returned rather than logged so callers can report them once tracing
    /// is initialized.
    pub fn startup_warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.schedule.run_timeout_secs > self.schedule.interval_secs {
            warnings.push(format!(
                "Run timeout ({}s) exceeds the schedule interval ({}s); overrunning runs will skip ticks",
                self.schedule.run_timeout_secs, self.schedule.interval_secs
            ));
        }
        warnings
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {1}: {0}")]
    Io(std::io::Error, std::path::PathBuf),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}

/// Expand environment variables in the format `${VAR_NAME}`.
/// Skips commented lines (lines where content before the variable is a comment).
fn expand_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}").expect("static regex is valid");
    let mut result = String::with_capacity(input.len());

    for line in input.lines() {
        let comment_pos = line.find('#');

        let mut line_result = String::with_capacity(line.len());
        let mut last_end = 0;

        for cap in re.captures_iter(line) {
            let Some(whole) = cap.get(0) else {
                continue;
            };

            // Skip if this variable is inside a comment
            if let Some(pos) = comment_pos
                && whole.start() >= pos
            {
                continue;
            }

            line_result.push_str(&line[last_end..whole.start()]);

            let var_name = &cap[1];
            let value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
            line_result.push_str(&value);

            last_end = whole.end();
        }

        line_result.push_str(&line[last_end..]);
        result.push_str(&line_result);
        result.push('\n');
    }

    // Remove trailing newline if input didn't have one
    if !input.ends_with('\n') && result.ends_with('\n') {
        result.pop();
    }

    Ok(result)
}
