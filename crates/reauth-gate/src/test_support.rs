//! In-memory fakes shared across the crate's tests.

use crate::gate::ReauthUi;
use crate::transport::{ApiRequest, ApiResponse, Transport, TransportError};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

type Responder = Box<dyn Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync>;

/// Scripted transport that records every request it sees.
pub(crate) struct MockTransport {
    responder: Responder,
    sent: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub(crate) fn with(
        responder: impl Fn(&ApiRequest) -> Result<ApiResponse, TransportError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn always_ok() -> Self {
        Self::with(|_| Ok(ApiResponse::new(StatusCode::OK, "{}")))
    }

    pub(crate) fn sent(&self) -> Vec<ApiRequest> {
        self.sent.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, TransportError> {
        self.sent.lock().expect("lock poisoned").push(request.clone());
        (self.responder)(request)
    }
}

/// Counting stand-in for the interactive re-auth UI.
pub(crate) struct RecordingUi {
    prompts: AtomicUsize,
}

impl RecordingUi {
    pub(crate) fn new() -> Self {
        Self {
            prompts: AtomicUsize::new(0),
        }
    }

    pub(crate) fn prompt_count(&self) -> usize {
        self.prompts.load(Ordering::SeqCst)
    }
}

impl ReauthUi for RecordingUi {
    fn present(&self) {
        self.prompts.fetch_add(1, Ordering::SeqCst);
    }
}
