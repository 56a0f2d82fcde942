//! HTTP side of the re-auth gate.
//!
//! This crate provides:
//! - [`HttpTransport`], a reqwest-backed implementation of the gate's
//!   transport seam
//! - [`ApiClient`], the shared front door that composes transport,
//!   interceptor, and gate (callers just send requests; expired sessions
//!   are handled behind the scenes)
//! - [`BroadcastReauthUi`], a broadcast-channel prompt so an external UI
//!   layer can subscribe and drive the interactive flow

mod client;
mod http;
mod ui;

pub use client::ApiClient;
pub use http::{HttpClientConfig, HttpTransport};
pub use ui::{BroadcastReauthUi, ReauthRequested};
