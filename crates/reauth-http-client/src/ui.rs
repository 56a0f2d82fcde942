//! Broadcast-channel re-auth prompt.

use reauth_gate::ReauthUi;
use tokio::sync::broadcast;
use tracing::warn;

/// Event emitted when the gate wants the interactive re-auth flow raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReauthRequested;

/// [`ReauthUi`] implementation that publishes [`ReauthRequested`] on a
/// broadcast channel.
///
/// The application's UI layer subscribes, opens its login popup or browser
/// tab when an event arrives, and reports the outcome back through the
/// gate. Lossy if nobody is subscribed; the gate's own state is unaffected
/// either way.
pub struct BroadcastReauthUi {
    event_tx: broadcast::Sender<ReauthRequested>,
}

impl BroadcastReauthUi {
    /// Create a prompt channel with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (event_tx, _) = broadcast::channel(capacity);
        Self { event_tx }
    }

    /// Subscribe to prompt events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReauthRequested> {
        self.event_tx.subscribe()
    }
}

impl Default for BroadcastReauthUi {
    fn default() -> Self {
        Self::new(8)
    }
}

impl ReauthUi for BroadcastReauthUi {
    fn present(&self) {
        if self.event_tx.send(ReauthRequested).is_err() {
            warn!("re-auth prompt requested but no UI subscriber is listening");
        }
    }
}
