//! OAuth2 service-account token exchange (two-legged JWT bearer flow).
//!
//! Each call to [`TokenClient::fetch_access_token`] signs a fresh assertion
//! and trades it for a bearer token at the configured token endpoint.
//! Tokens are held as a pre-formatted `Bearer {token}` header behind an
//! `Arc<str>` so every query in a run can borrow it without reallocating.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use super::{AuthError, CredentialsError, ServiceAccountCredentials};
use crate::config::AnalyticsConfig;

const JWT_BEARER_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// Lifetime requested for each signed assertion.
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Claims of the signed assertion sent to the token endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssertionClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// A short-lived bearer token.
#[derive(Clone)]
pub struct AccessToken {
    /// Pre-formatted header value: "Bearer {token}"
    bearer_header: Arc<str>,
    expires_at: Option<Instant>,
}

impl AccessToken {
    pub fn new(token: &str, expires_in: Option<Duration>) -> Self {
        Self {
            bearer_header: format!("Bearer {token}").into(),
            expires_at: expires_in.map(|d| Instant::now() + d),
        }
    }

    /// Value for the `Authorization` header.
    pub fn bearer_header(&self) -> &str {
        &self.bearer_header
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at
            .is_some_and(|expires_at| Instant::now() >= expires_at)
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("bearer_header", &"Bearer ****")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Signed-JWT OAuth2 client for a single service account.
pub struct TokenClient {
    issuer: String,
    scope: String,
    token_uri: String,
    signing_key: EncodingKey,
    http: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for TokenClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenClient")
            .field("issuer", &self.issuer)
            .field("scope", &self.scope)
            .field("token_uri", &self.token_uri)
            .finish_non_exhaustive()
    }
}

impl TokenClient {
    /// Build a token client bound to the configured endpoint and scope.
    ///
    /// Fails if the private key cannot be decoded.
    pub fn new(
        credentials: &ServiceAccountCredentials,
        config: &AnalyticsConfig,
        http: reqwest::Client,
    ) -> Result<Self, CredentialsError> {
        Ok(Self {
            issuer: credentials.email.clone(),
            scope: config.scope.clone(),
            token_uri: config.token_uri.clone(),
            signing_key: credentials.signing_key()?,
            http,
            timeout: config.request_timeout(),
        })
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Sign a new assertion valid from now for [`ASSERTION_LIFETIME_SECS`].
    fn sign_assertion(&self) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = AssertionClaims {
            iss: self.issuer.clone(),
            scope: self.scope.clone(),
            // The token endpoint doubles as the audience
            aud: self.token_uri.clone(),
            iat,
            exp: iat + ASSERTION_LIFETIME_SECS,
        };

        Ok(jsonwebtoken::encode(
            &Header::new(Algorithm::RS256),
            &claims,
            &self.signing_key,
        )?)
    }

    /// Exchange a freshly signed assertion for a bearer token.
    #[tracing::instrument(skip(self), fields(issuer = %self.issuer))]
    pub async fn fetch_access_token(&self) -> Result<AccessToken, AuthError> {
        let assertion = self.sign_assertion()?;

        let response = self
            .http
            .post(&self.token_uri)
            .timeout(self.timeout)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT_TYPE),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {}", err.error, description),
                    None => err.error,
                },
                Err(_) => body,
            };
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        if let Some(token_type) = &token.token_type
            && !token_type.eq_ignore_ascii_case("bearer")
        {
            return Err(AuthError::InvalidResponse(format!(
                "unsupported token type '{token_type}'"
            )));
        }

        tracing::debug!(
            expires_in_secs = token.expires_in,
            "Acquired new analytics access token"
        );

        Ok(AccessToken::new(
            &token.access_token,
            token.expires_in.map(Duration::from_secs),
        ))
    }
}
