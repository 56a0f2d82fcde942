//! Single-flight coordination of the re-authentication flow.
//!
//! One [`AuthGate`] exists per client session. When a request fails with an
//! expired session it is parked here as a waiter; the first such failure
//! starts an auth cycle and raises the interactive prompt, every later one
//! queues silently. When the external flow reports its outcome the whole
//! queue is drained at once: replayed through the transport on success,
//! rejected together on failure.

use crate::error::{GateError, GateResult};
use crate::transport::{ApiRequest, ApiResponse, Transport};
use std::sync::{Arc, Mutex};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Capability that raises the interactive re-auth UI.
///
/// Invoked at most once per auth cycle, fire-and-forget: the UI drives its
/// own lifecycle and reports the eventual outcome through
/// [`AuthGate::auth_succeeded`] or [`AuthGate::auth_failed`].
pub trait ReauthUi: Send + Sync {
    /// Trigger the interactive re-auth flow.
    fn present(&self);
}

/// One request suspended until the current auth cycle resolves.
///
/// The oneshot sender is move-only, so each waiter is completed exactly
/// once: either with the replay outcome or with a rejection.
struct Waiter {
    request: ApiRequest,
    tx: oneshot::Sender<GateResult<ApiResponse>>,
}

/// Mutable gate state. Read-modify-written only under the gate's mutex so
/// concurrent enqueues can never both observe `prompt_shown == false`.
#[derive(Default)]
struct GateState {
    in_progress: bool,
    prompt_shown: bool,
    waiters: Vec<Waiter>,
}

/// Snapshot of the gate's state, for observability and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GateStatus {
    /// Whether an auth cycle is live.
    pub cycle_active: bool,
    /// Whether the current cycle has raised its prompt.
    pub prompt_shown: bool,
    /// Number of requests waiting on the cycle's outcome.
    pub queued: usize,
}

/// Process-wide coordinator for expired-session failures.
///
/// Owns the single-flight lock, the prompt-shown flag, and the waiter
/// queue. The transport and the UI capability are borrowed handles; the
/// gate never fails itself, failures only surface through rejected
/// waiters.
pub struct AuthGate {
    transport: Arc<dyn Transport>,
    ui: Arc<dyn ReauthUi>,
    state: Mutex<GateState>,
}

impl AuthGate {
    /// Create a gate over the given transport and re-auth UI capability.
    pub fn new(transport: Arc<dyn Transport>, ui: Arc<dyn ReauthUi>) -> Self {
        Self {
            transport,
            ui,
            state: Mutex::new(GateState::default()),
        }
    }

    /// Park a request that failed with an expired session until the current
    /// auth cycle resolves.
    ///
    /// Starts a cycle if none is live, and raises the prompt if this cycle
    /// has not shown it yet. The prompt decision happens under the gate
    /// lock; the actual UI call happens after the lock is released so
    /// arbitrary UI code never runs inside the critical section.
    ///
    /// The returned [`PendingReplay`] resolves when the cycle ends: with
    /// the replay's transport outcome after [`auth_succeeded`], or with
    /// [`GateError::ReauthAbandoned`] after [`auth_failed`].
    ///
    /// [`auth_succeeded`]: Self::auth_succeeded
    /// [`auth_failed`]: Self::auth_failed
    pub fn enqueue_for_reauth(&self, request: ApiRequest) -> PendingReplay {
        let (tx, rx) = oneshot::channel();
        let request_id = request.id;

        let fire_prompt = {
            let mut state = self.state.lock().expect("lock poisoned");
            state.waiters.push(Waiter { request, tx });

            if !state.in_progress {
                state.in_progress = true;
            }

            if !state.prompt_shown {
                state.prompt_shown = true;
                true
            } else {
                false
            }
        };

        if fire_prompt {
            info!(request_id = %request_id, "session expired, raising re-auth prompt");
            self.ui.present();
        } else {
            debug!(request_id = %request_id, "session expired, queued behind live re-auth cycle");
        }

        PendingReplay { rx }
    }

    /// Report that the external re-auth flow succeeded.
    ///
    /// Ends the cycle and replays every queued request once, with the
    /// retried marker set. Each replay runs in its own task so a slow or
    /// failing replay cannot block the gate for subsequent cycles; no
    /// ordering is promised between replay completions.
    ///
    /// Accepted as a no-op when no cycle is live.
    pub fn auth_succeeded(&self) {
        let drained = self.end_cycle();
        if drained.is_empty() {
            debug!("re-auth succeeded with nothing queued");
            return;
        }

        info!(waiters = drained.len(), "re-auth succeeded, replaying queued requests");
        for Waiter { request, tx } in drained {
            let transport = Arc::clone(&self.transport);
            tokio::spawn(async move {
                let request = request.into_retry();
                let outcome = transport
                    .send(&request)
                    .await
                    .map_err(GateError::Transport);
                // The caller may have given up on the receiver; nothing to
                // do about that here.
                let _ = tx.send(outcome);
            });
        }
    }

    /// Report that the external re-auth flow failed or was cancelled.
    ///
    /// Ends the cycle and rejects every queued request with the reason.
    /// Nothing is re-submitted.
    pub fn auth_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let drained = self.end_cycle();

        warn!(
            waiters = drained.len(),
            reason = %reason,
            "re-auth abandoned, rejecting queued requests"
        );
        for Waiter { tx, .. } in drained {
            let _ = tx.send(Err(GateError::ReauthAbandoned(reason.clone())));
        }
    }

    /// Snapshot the gate state.
    pub fn status(&self) -> GateStatus {
        let state = self.state.lock().expect("lock poisoned");
        GateStatus {
            cycle_active: state.in_progress,
            prompt_shown: state.prompt_shown,
            queued: state.waiters.len(),
        }
    }

    /// Capture the queue and reset to idle in one atomic step, so an
    /// enqueue racing with cycle resolution either lands in the drained
    /// batch or starts a fresh cycle with its own prompt.
    fn end_cycle(&self) -> Vec<Waiter> {
        let mut state = self.state.lock().expect("lock poisoned");
        state.in_progress = false;
        state.prompt_shown = false;
        std::mem::take(&mut state.waiters)
    }
}

/// Future side of a parked request.
///
/// Resolves exactly once when the auth cycle it belongs to ends. If the
/// gate is dropped first the underlying channel closes and [`wait`]
/// returns [`GateError::GateClosed`] instead of hanging.
///
/// [`wait`]: Self::wait
pub struct PendingReplay {
    rx: oneshot::Receiver<GateResult<ApiResponse>>,
}

impl PendingReplay {
    /// Await the outcome of the replay (or the cycle's rejection).
    pub async fn wait(self) -> GateResult<ApiResponse> {
        match self.rx.await {
            Ok(outcome) => outcome,
            Err(_) => Err(GateError::GateClosed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MockTransport, RecordingUi};
    use crate::transport::TransportError;
    use futures_util::future::join_all;
    use reqwest::StatusCode;

    fn gate_over(transport: MockTransport) -> (Arc<AuthGate>, Arc<RecordingUi>, Arc<MockTransport>) {
        let transport = Arc::new(transport);
        let ui = Arc::new(RecordingUi::new());
        let gate = Arc::new(AuthGate::new(
            transport.clone() as Arc<dyn Transport>,
            ui.clone() as Arc<dyn ReauthUi>,
        ));
        (gate, ui, transport)
    }

    #[test]
    fn starts_idle() {
        let (gate, ui, _) = gate_over(MockTransport::always_ok());
        let status = gate.status();
        assert!(!status.cycle_active);
        assert!(!status.prompt_shown);
        assert_eq!(status.queued, 0);
        assert_eq!(ui.prompt_count(), 0);
    }

    #[tokio::test]
    async fn first_enqueue_starts_cycle_and_prompts() {
        let (gate, ui, _) = gate_over(MockTransport::always_ok());

        let _pending = gate.enqueue_for_reauth(ApiRequest::get("people/1"));

        assert_eq!(ui.prompt_count(), 1);
        assert_eq!(
            gate.status(),
            GateStatus {
                cycle_active: true,
                prompt_shown: true,
                queued: 1,
            }
        );
    }

    #[tokio::test]
    async fn later_enqueues_queue_silently() {
        let (gate, ui, _) = gate_over(MockTransport::always_ok());

        let _p1 = gate.enqueue_for_reauth(ApiRequest::get("people/1"));
        let _p2 = gate.enqueue_for_reauth(ApiRequest::get("people/2"));
        let _p3 = gate.enqueue_for_reauth(ApiRequest::get("people/3"));

        assert_eq!(ui.prompt_count(), 1);
        assert_eq!(gate.status().queued, 3);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_enqueues_prompt_exactly_once() {
        let (gate, ui, _) = gate_over(MockTransport::always_ok());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let gate = Arc::clone(&gate);
                tokio::spawn(async move {
                    gate.enqueue_for_reauth(ApiRequest::get(format!("people/{i}")))
                })
            })
            .collect();
        let pendings: Vec<PendingReplay> = join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.expect("enqueue task panicked"))
            .collect();

        assert_eq!(ui.prompt_count(), 1);
        assert_eq!(gate.status().queued, 16);

        gate.auth_succeeded();
        for pending in pendings {
            pending.wait().await.expect("replay should succeed");
        }
    }

    #[tokio::test]
    async fn auth_succeeded_replays_all_with_marker_and_resets() {
        let (gate, ui, transport) = gate_over(MockTransport::always_ok());

        let pendings: Vec<_> = (1..=3)
            .map(|i| gate.enqueue_for_reauth(ApiRequest::get(format!("people/{i}"))))
            .collect();

        gate.auth_succeeded();

        for pending in pendings {
            let response = pending.wait().await.expect("replay should succeed");
            assert_eq!(response.status, StatusCode::OK);
        }

        let sent = transport.sent();
        assert_eq!(sent.len(), 3);
        assert!(sent.iter().all(ApiRequest::is_retried));

        let status = gate.status();
        assert!(!status.cycle_active);
        assert!(!status.prompt_shown);
        assert_eq!(status.queued, 0);

        // A later expiry starts a fresh cycle with a fresh prompt.
        let _pending = gate.enqueue_for_reauth(ApiRequest::get("people/4"));
        assert_eq!(ui.prompt_count(), 2);
    }

    #[tokio::test]
    async fn auth_failed_rejects_all_without_replaying() {
        let (gate, _ui, transport) = gate_over(MockTransport::always_ok());

        let pendings: Vec<_> = (1..=3)
            .map(|i| gate.enqueue_for_reauth(ApiRequest::get(format!("people/{i}"))))
            .collect();

        gate.auth_failed("user cancelled");

        for pending in pendings {
            let err = pending.wait().await.expect_err("waiter must be rejected");
            assert!(
                matches!(&err, GateError::ReauthAbandoned(reason) if reason == "user cancelled"),
                "unexpected error: {err}"
            );
        }

        assert!(transport.sent().is_empty());
        assert!(!gate.status().cycle_active);
    }

    #[tokio::test]
    async fn failed_replay_surfaces_to_its_caller_only() {
        let transport = MockTransport::with(|request| {
            if request.path == "people/2" {
                Err(TransportError::Status {
                    status: StatusCode::UNAUTHORIZED,
                    body: String::new(),
                })
            } else {
                Ok(ApiResponse::new(StatusCode::OK, "{}"))
            }
        });
        let (gate, ui, _) = gate_over(transport);

        let p1 = gate.enqueue_for_reauth(ApiRequest::get("people/1"));
        let p2 = gate.enqueue_for_reauth(ApiRequest::get("people/2"));
        let p3 = gate.enqueue_for_reauth(ApiRequest::get("people/3"));

        gate.auth_succeeded();

        assert!(p1.wait().await.is_ok());
        let err = p2.wait().await.expect_err("replay of people/2 fails");
        assert!(matches!(
            &err,
            GateError::Transport(TransportError::Status { status, .. })
                if *status == StatusCode::UNAUTHORIZED
        ));
        assert!(p3.wait().await.is_ok());

        // The failed replay does not restart a cycle or raise the prompt.
        assert!(!gate.status().cycle_active);
        assert_eq!(ui.prompt_count(), 1);
    }

    #[tokio::test]
    async fn resolving_an_idle_gate_is_a_no_op() {
        let (gate, ui, transport) = gate_over(MockTransport::always_ok());

        gate.auth_succeeded();
        gate.auth_failed("stray cancel");

        assert!(!gate.status().cycle_active);
        assert_eq!(ui.prompt_count(), 0);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn dropping_the_gate_closes_waiters() {
        let transport: Arc<dyn Transport> = Arc::new(MockTransport::always_ok());
        let ui: Arc<dyn ReauthUi> = Arc::new(RecordingUi::new());
        let gate = AuthGate::new(transport, ui);

        let pending = gate.enqueue_for_reauth(ApiRequest::get("people/1"));
        drop(gate);

        let err = pending.wait().await.expect_err("channel closed");
        assert!(matches!(err, GateError::GateClosed));
    }
}
