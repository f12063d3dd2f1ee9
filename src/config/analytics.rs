use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Highest goal slot the reporting API exposes per view.
pub const MAX_GOAL_ID: u32 = 20;

/// Reporting API and OAuth2 token endpoint settings.
///
/// ```toml
/// [analytics]
/// token_uri = "https://accounts.google.com/o/oauth2/token"
/// scope = "https://www.googleapis.com/auth/analytics.readonly"
/// api_base_url = "https://www.googleapis.com/analytics/v3"
/// goal_ids = [1, 2, 3]
/// window_days = 30
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyticsConfig {
    /// OAuth2 token endpoint. Also used as the JWT audience.
    #[serde(default = "default_token_uri")]
    pub token_uri: String,

    /// Scope requested for the bearer token.
    #[serde(default = "default_scope")]
    pub scope: String,

    /// Base URL of the Core Reporting API.
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Goal slots to report on. Each produces three widget events.
    #[serde(default = "default_goal_ids")]
    pub goal_ids: Vec<u32>,

    /// Length of the reporting window in days. The window always ends
    /// yesterday.
    #[serde(default = "default_window_days")]
    pub window_days: u32,

    /// Timeout for each token or reporting request, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            token_uri: default_token_uri(),
            scope: default_scope(),
            api_base_url: default_api_base_url(),
            goal_ids: default_goal_ids(),
            window_days: default_window_days(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AnalyticsConfig {
    /// Get the request timeout as a Duration.
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for &id in &self.goal_ids {
            if !(1..=MAX_GOAL_ID).contains(&id) {
                return Err(ConfigError::Validation(format!(
                    "analytics.goal_ids: goal {id} is outside 1..={MAX_GOAL_ID}"
                )));
            }
            if !seen.insert(id) {
                return Err(ConfigError::Validation(format!(
                    "analytics.goal_ids: goal {id} is listed more than once"
                )));
            }
        }

        if self.window_days == 0 {
            return Err(ConfigError::Validation(
                "analytics.window_days must be at least 1".into(),
            ));
        }

        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "analytics.request_timeout_secs must be at least 1".into(),
            ));
        }

        for (field, value) in [
            ("token_uri", &self.token_uri),
            ("api_base_url", &self.api_base_url),
        ] {
            url::Url::parse(value).map_err(|e| {
                ConfigError::Validation(format!("analytics.{field} is not a valid URL: {e}"))
            })?;
        }

        Ok(())
    }
}

fn default_token_uri() -> String {
    "https://accounts.google.com/o/oauth2/token".to_string()
}

fn default_scope() -> String {
    "https://www.googleapis.com/auth/analytics.readonly".to_string()
}

fn default_api_base_url() -> String {
    "https://www.googleapis.com/analytics/v3".to_string()
}

fn default_goal_ids() -> Vec<u32> {
    (1..=MAX_GOAL_ID).collect()
}

fn default_window_days() -> u32 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_defaults_validate() {
        AnalyticsConfig::default().validate().unwrap();
    }

    #[rstest]
    #[case(vec![0], "outside")]
    #[case(vec![21], "outside")]
    #[case(vec![2, 5, 2], "more than once")]
    fn test_invalid_goal_ids(#[case] goal_ids: Vec<u32>, #[case] expected: &str) {
        let config = AnalyticsConfig {
            goal_ids,
            ..Default::default()
        };
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains(expected), "unexpected message: {msg}");
    }

    #[test]
    fn test_empty_goal_ids_allowed() {
        let config = AnalyticsConfig {
            goal_ids: vec![],
            ..Default::default()
        };
        config.validate().unwrap();
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = AnalyticsConfig {
            window_days: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_token_uri_rejected() {
        let config = AnalyticsConfig {
            token_uri: "not a url".into(),
            ..Default::default()
        };
        let msg = config.validate().unwrap_err().to_string();
        assert!(msg.contains("token_uri"), "unexpected message: {msg}");
    }
}
