use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Dashboard event sink selection.
///
/// ```toml
/// # Push to a Dashing-compatible widget API
/// [dashboard]
/// type = "http"
/// url = "http://localhost:3030"
/// auth_token = "${DASHING_AUTH_TOKEN}"
///
/// # Or just log every event (default)
/// [dashboard]
/// type = "log"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DashboardConfig {
    /// Write each event to the log.
    #[default]
    Log,
    /// POST each event to `<url>/widgets/<event name>`.
    Http(HttpDashboardConfig),
}

impl DashboardConfig {
    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        match self {
            DashboardConfig::Log => Ok(()),
            DashboardConfig::Http(http) => http.validate(),
        }
    }
}

/// Settings for the HTTP widget push sink.
#[derive(Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpDashboardConfig {
    /// Base URL of the dashboard server.
    pub url: String,

    /// Token included in every push as `auth_token`.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl HttpDashboardConfig {
    /// Get the request timeout as a Duration.
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let parsed = url::Url::parse(&self.url).map_err(|e| {
            ConfigError::Validation(format!("dashboard.url is not a valid URL: {e}"))
        })?;
        if parsed.cannot_be_a_base() {
            return Err(ConfigError::Validation(format!(
                "dashboard.url cannot be used as a base URL: {}",
                self.url
            )));
        }
        Ok(())
    }
}

impl std::fmt::Debug for HttpDashboardConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDashboardConfig")
            .field("url", &self.url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "****"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

fn default_timeout_secs() -> u64 {
    10
}
