//! Async client for the VPN portal's node API.
//!
//! A server node talks to the portal for three things:
//!
//! - **[`PortalClient::profile_list`]** — the declarative profile map that
//!   drives config and firewall synthesis,
//! - **[`PortalClient::add_server_certificate`]** — per-profile server key
//!   material, issued against a caller-chosen common name,
//! - **[`PortalClient::connect`] / [`PortalClient::disconnect`]** — session
//!   event relay for the OpenVPN connect/disconnect hooks.
//!
//! All responses use the portal's `{ok, data, error}` envelope; failures are
//! mapped into [`ApiError`]. The engine never retries — transient-failure
//! policy belongs to the caller.

pub mod client;
pub mod error;
pub mod transport;
pub mod types;

pub use client::PortalClient;
pub use error::ApiError;
pub use transport::{TlsMode, TransportConfig};
pub use types::{CertificateBundle, ConnectEvent, DisconnectEvent};
