//! Service-account authentication for the reporting API.
//!
//! Credentials are read once at startup. A bad or missing credential never
//! stops the process: it produces an [`Authenticator::Unconfigured`] that
//! scheduled runs check and skip on, so one misconfigured widget source does
//! not take the dashboard feeder down.

mod credentials;
mod error;
mod token;

pub use credentials::*;
pub use error::{AuthError, CredentialsError};
pub use token::{AccessToken, TokenClient};

use crate::config::AnalyticsConfig;

/// Startup authentication state.
#[derive(Debug)]
pub enum Authenticator {
    /// Credentials loaded and the signing key decoded.
    Ready {
        tokens: TokenClient,
        view_id: String,
    },
    /// Credentials are missing or invalid; runs are skipped.
    Unconfigured { reason: String },
}

impl Authenticator {
    /// Load credentials from the environment and build the token client.
    pub fn from_env(config: &AnalyticsConfig, http: reqwest::Client) -> Self {
        Self::from_credentials(ServiceAccountCredentials::from_env(), config, http)
    }

    /// Build the authenticator from already-loaded credentials.
    ///
    /// Errors are logged as a warning and captured in `Unconfigured`.
    pub fn from_credentials(
        credentials: Result<ServiceAccountCredentials, CredentialsError>,
        config: &AnalyticsConfig,
        http: reqwest::Client,
    ) -> Self {
        let ready = credentials.and_then(|creds| {
            TokenClient::new(&creds, config, http).map(|tokens| (tokens, creds.view_id))
        });

        match ready {
            Ok((tokens, view_id)) => {
                tracing::info!(
                    issuer = %tokens.issuer(),
                    view_id = %view_id,
                    "Loaded analytics service account credentials"
                );
                Self::Ready { tokens, view_id }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "For the Google Analytics widgets to work, you must complete the \
                     configuration steps (including a private key). Scheduled runs will be skipped."
                );
                Self::Unconfigured {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}
