//! Gate error types.

use crate::transport::TransportError;
use thiserror::Error;

/// Error surfaced to the caller of a gated request.
///
/// A gated request either resolves with the eventual replay response or
/// fails with one of these; the gate itself never swallows an outcome.
#[derive(Error, Debug)]
pub enum GateError {
    /// Transport failure, either from the original send or from the replay.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The external re-auth flow was cancelled or failed.
    #[error("re-authentication abandoned: {0}")]
    ReauthAbandoned(String),

    /// The gate was dropped while this request was still queued.
    #[error("auth gate shut down before the request could be replayed")]
    GateClosed,
}

/// Result type alias using GateError.
pub type GateResult<T> = Result<T, GateError>;
