use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use serde::Deserialize;

use super::{QueryResult, ReportRequest};
use crate::{auth::AccessToken, config::AnalyticsConfig};

/// Errors from the reporting API.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsError {
    #[error("reporting request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("reporting API returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("reporting API returned an invalid body: {0}")]
    Decode(String),
}

/// Read-only access to report data.
#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn query(
        &self,
        token: &AccessToken,
        request: &ReportRequest<'_>,
    ) -> Result<QueryResult, AnalyticsError>;
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
}

/// Core Reporting API (v3) client.
#[derive(Debug, Clone)]
pub struct ReportingClient {
    data_url: String,
    http: reqwest::Client,
    timeout: Duration,
}

impl ReportingClient {
    pub fn new(config: &AnalyticsConfig, http: reqwest::Client) -> Self {
        Self {
            data_url: format!("{}/data/ga", config.api_base_url.trim_end_matches('/')),
            http,
            timeout: config.request_timeout(),
        }
    }
}

#[async_trait]
impl AnalyticsApi for ReportingClient {
    #[tracing::instrument(
        skip(self, token, request),
        fields(
            metrics = %request.query.metrics,
            dimensions = ?request.query.dimensions,
        )
    )]
    async fn query(
        &self,
        token: &AccessToken,
        request: &ReportRequest<'_>,
    ) -> Result<QueryResult, AnalyticsError> {
        let response = self
            .http
            .get(&self.data_url)
            .timeout(self.timeout)
            .header(AUTHORIZATION, token.bearer_header())
            .query(&request.params())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AnalyticsError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let result: QueryResult =
            serde_json::from_str(&body).map_err(|e| AnalyticsError::Decode(e.to_string()))?;

        tracing::debug!(rows = result.rows.len(), "Report query complete");

        Ok(result)
    }
}
