use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::{DashboardEvent, EventSink, SinkError};
use crate::{config::HttpDashboardConfig, widgets::Payload};

/// Request body: the payload fields plus an optional `auth_token`.
#[derive(Serialize)]
struct WidgetPush<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    auth_token: Option<&'a str>,
    #[serde(flatten)]
    payload: &'a Payload,
}

/// Pushes events to a Dashing-compatible widget API.
pub struct HttpSink {
    base_url: String,
    auth_token: Option<String>,
    http: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for HttpSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSink")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "****"))
            .finish_non_exhaustive()
    }
}

impl HttpSink {
    pub fn new(config: &HttpDashboardConfig, http: reqwest::Client) -> Self {
        Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            auth_token: config.auth_token.clone(),
            http,
            timeout: config.timeout(),
        }
    }

    fn widget_url(&self, name: &str) -> String {
        format!("{}/widgets/{}", self.base_url, name)
    }
}

#[async_trait]
impl EventSink for HttpSink {
    async fn emit(&self, event: &DashboardEvent) -> Result<(), SinkError> {
        let body = WidgetPush {
            auth_token: self.auth_token.as_deref(),
            payload: &event.payload,
        };

        let response = self
            .http
            .post(self.widget_url(&event.name))
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(event = %event.name, status = status.as_u16(), "Pushed widget event");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    use super::*;
    use crate::widgets::ListItem;

    fn sink_for(server: &MockServer, auth_token: Option<&str>) -> HttpSink {
        HttpSink::new(
            &HttpDashboardConfig {
                url: format!("{}/", server.uri()),
                auth_token: auth_token.map(str::to_string),
                timeout_secs: 5,
            },
            reqwest::Client::new(),
        )
    }

    #[tokio::test]
    async fn test_push_includes_auth_token_and_payload() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/widgets/ga_sessions"))
            .and(body_json(serde_json::json!({
                "auth_token": "YOUR_AUTH_TOKEN",
                "current": 5000
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        sink_for(&server, Some("YOUR_AUTH_TOKEN"))
            .emit(&DashboardEvent::new("ga_sessions", Payload::count(5000)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_push_without_auth_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/widgets/ga_traffic_sources"))
            .and(body_json(serde_json::json!({
                "items": [{ "label": "Direct", "value": "900" }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let payload = Payload::List {
            items: vec![ListItem {
                label: "Direct".into(),
                value: "900".into(),
            }],
        };
        sink_for(&server, None)
            .emit(&DashboardEvent::new("ga_traffic_sources", payload))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_push() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Invalid API key"))
            .mount(&server)
            .await;

        let err = sink_for(&server, Some("wrong"))
            .emit(&DashboardEvent::new("ga_sessions", Payload::count(1)))
            .await
            .unwrap_err();

        match err {
            SinkError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "Invalid API key");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[test]
    fn test_debug_hides_auth_token() {
        let sink = HttpSink::new(
            &HttpDashboardConfig {
                url: "http://localhost:3030".into(),
                auth_token: Some("secret-token".into()),
                timeout_secs: 5,
            },
            reqwest::Client::new(),
        );
        let debug = format!("{sink:?}");
        assert!(!debug.contains("secret-token"));
    }
}
