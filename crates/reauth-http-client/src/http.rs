//! reqwest-backed transport.

use async_trait::async_trait;
use reauth_gate::{ApiRequest, ApiResponse, Transport, TransportError};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP transport configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every request path is joined to.
    pub base_url: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Transport that sends requests over HTTP with a shared reqwest client.
///
/// Non-success statuses become [`TransportError::Status`] with the body
/// preserved, so the interceptor can classify 401s and callers keep the
/// server's diagnostics for everything else.
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from the given configuration.
    pub fn new(config: HttpClientConfig) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http_client,
            base_url: config.base_url,
        })
    }

    /// Join a request path onto the base URL.
    fn request_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        let url = self.request_url(&request.path);
        debug!(
            request_id = %request.id,
            method = %request.method,
            url = %url,
            retried = request.is_retried(),
            "sending request"
        );

        let mut builder = self.http_client.request(request.method.clone(), &url);
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            // Diagnostic only; a failed read still reports the status.
            let body = response.text().await.unwrap_or_default();
            if status == StatusCode::UNAUTHORIZED {
                debug!(request_id = %request.id, "session credential rejected (401)");
            } else {
                warn!(request_id = %request.id, status = %status, "request failed");
            }
            return Err(TransportError::Status { status, body });
        }

        let body = response.text().await?;
        Ok(ApiResponse::new(status, body))
    }
}
