//! Shared API client with the gate wired into its failure path.

use crate::http::{HttpClientConfig, HttpTransport};
use reauth_gate::{
    ApiRequest, ApiResponse, AuthGate, FailureDisposition, GateError, GateResult, ReauthUi,
    RequestInterceptor, Transport, TransportError,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::debug;

/// The single client instance an application sends its API traffic
/// through.
///
/// On an expired-session failure the caller's `send` simply takes longer:
/// the request parks on the gate, the re-auth flow runs out-of-band, and
/// the eventual replay outcome is returned as if the expiry never
/// happened. Every other failure surfaces unchanged.
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    gate: Arc<AuthGate>,
    interceptor: RequestInterceptor,
}

impl ApiClient {
    /// Compose a client from a transport and a re-auth UI capability.
    pub fn new(transport: Arc<dyn Transport>, ui: Arc<dyn ReauthUi>) -> Self {
        let gate = Arc::new(AuthGate::new(Arc::clone(&transport), ui));
        let interceptor = RequestInterceptor::new(Arc::clone(&gate));
        Self {
            transport,
            gate,
            interceptor,
        }
    }

    /// Convenience constructor over an [`HttpTransport`].
    pub fn with_config(
        config: HttpClientConfig,
        ui: Arc<dyn ReauthUi>,
    ) -> Result<Self, TransportError> {
        let transport = Arc::new(HttpTransport::new(config)?);
        Ok(Self::new(transport, ui))
    }

    /// Handle to the gate, for the code that owns the re-auth flow's
    /// outcome to report [`AuthGate::auth_succeeded`] or
    /// [`AuthGate::auth_failed`].
    pub fn gate(&self) -> Arc<AuthGate> {
        Arc::clone(&self.gate)
    }

    /// Send a request, transparently riding out an expired session.
    pub async fn send(&self, request: ApiRequest) -> GateResult<ApiResponse> {
        match self.transport.send(&request).await {
            Ok(response) => Ok(response),
            Err(failure) => match self.interceptor.on_failure(request, failure) {
                FailureDisposition::Replay(pending) => {
                    let outcome = pending.wait().await;
                    debug!(ok = outcome.is_ok(), "gated request resolved");
                    outcome
                }
                FailureDisposition::Propagate(failure) => Err(GateError::Transport(failure)),
            },
        }
    }

    /// GET a path and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> GateResult<T> {
        let response = self.send(ApiRequest::get(path)).await?;
        Ok(response.json().map_err(TransportError::from)?)
    }
}
