//! Single-flight re-authentication gate for HTTP clients.
//!
//! This crate provides:
//! - An [`AuthGate`] that coordinates concurrent requests failing with an
//!   expired session: one re-auth prompt, everyone else queues, everything
//!   replays once (or fails together) when the out-of-band flow resolves
//! - A [`RequestInterceptor`] that classifies transport failures and hands
//!   expired-session failures to the gate
//! - A [`Transport`] trait the gate re-submits queued requests through
//!
//! The interactive re-auth flow itself lives outside this crate: the gate
//! fires [`ReauthUi::present`] at most once per cycle, and whatever code
//! owns the flow's outcome reports it back via [`AuthGate::auth_succeeded`]
//! or [`AuthGate::auth_failed`].

mod error;
mod gate;
mod interceptor;
mod transport;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{GateError, GateResult};
pub use gate::{AuthGate, GateStatus, PendingReplay, ReauthUi};
pub use interceptor::{FailureDisposition, RequestInterceptor};
pub use transport::{ApiRequest, ApiResponse, Transport, TransportError};
