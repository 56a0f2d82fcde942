//! Transport seam: request/response types and the send capability.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use uuid::Uuid;

/// An outbound API request, kept in a re-sendable form so the gate can
/// replay it after re-authentication.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// Request id used to correlate log lines across the original send and
    /// any replay.
    pub id: Uuid,
    /// HTTP method.
    pub method: Method,
    /// Path relative to the transport's base URL.
    pub path: String,
    /// Optional JSON body.
    pub body: Option<serde_json::Value>,
    /// Set once the gate has replayed this request. A retried request is
    /// never enqueued again.
    retried: bool,
}

impl ApiRequest {
    /// Create a request with the given method and path.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            method,
            path: path.into(),
            body: None,
            retried: false,
        }
    }

    /// Convenience constructor for a GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    /// Convenience constructor for a POST request with a JSON body.
    pub fn post(path: impl Into<String>, body: serde_json::Value) -> Self {
        let mut request = Self::new(Method::POST, path);
        request.body = Some(body);
        request
    }

    /// Whether this request has already been replayed once.
    pub fn is_retried(&self) -> bool {
        self.retried
    }

    /// Marks the request as replayed. Consumed by the gate when it
    /// re-submits; the marker is never cleared.
    pub(crate) fn into_retry(mut self) -> Self {
        self.retried = true;
        self
    }
}

/// A successful API response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status (always in the success range).
    pub status: StatusCode,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Create a response from a status and body text.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }
}

/// Transport failure.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection-level HTTP error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("request failed with status {status}")]
    Status {
        /// Response status code.
        status: StatusCode,
        /// Response body, kept for diagnostics.
        body: String,
    },

    /// The response body was not the expected JSON shape.
    #[error("invalid JSON response: {0}")]
    Json(#[from] serde_json::Error),
}

impl TransportError {
    /// Whether this failure means the session credential has expired.
    ///
    /// Only a definite 401 counts; connection errors and other statuses
    /// never trigger the gate.
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::Status { status, .. } if *status == StatusCode::UNAUTHORIZED)
    }
}

/// The underlying send capability.
///
/// Used for both original sends and gate replays. Implementations convert
/// non-success statuses into [`TransportError::Status`] so the interceptor
/// can classify them.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return the response or a failure.
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError>;
}
