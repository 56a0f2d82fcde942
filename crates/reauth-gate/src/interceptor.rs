//! Failure classification in front of the auth gate.

use crate::gate::{AuthGate, PendingReplay};
use crate::transport::{ApiRequest, TransportError};
use std::sync::Arc;
use tracing::{debug, warn};

/// What to do with a failed request.
pub enum FailureDisposition {
    /// The request is parked on the gate; await the replay outcome.
    Replay(PendingReplay),
    /// Not a gate concern; surface the failure unchanged.
    Propagate(TransportError),
}

/// Stateless classification layer wired into the transport's failure path.
///
/// Expired-session failures are delegated to the gate, everything else
/// passes through untouched. A request that already carries the retried
/// marker is never delegated again, which bounds every original request to
/// at most one replay.
pub struct RequestInterceptor {
    gate: Arc<AuthGate>,
}

impl RequestInterceptor {
    /// Create an interceptor delegating to the given gate.
    pub fn new(gate: Arc<AuthGate>) -> Self {
        Self { gate }
    }

    /// Classify a transport failure for `request`.
    pub fn on_failure(
        &self,
        request: ApiRequest,
        failure: TransportError,
    ) -> FailureDisposition {
        if !failure.is_auth_expired() {
            return FailureDisposition::Propagate(failure);
        }

        if request.is_retried() {
            warn!(
                request_id = %request.id,
                path = %request.path,
                "replayed request still rejected with expired session, giving up"
            );
            return FailureDisposition::Propagate(failure);
        }

        debug!(request_id = %request.id, path = %request.path, "expired session, delegating to auth gate");
        FailureDisposition::Replay(self.gate.enqueue_for_reauth(request))
    }
}
