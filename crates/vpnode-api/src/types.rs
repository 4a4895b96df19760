//! Wire types for the portal node API.

use serde::{Deserialize, Serialize};

/// Standard portal response envelope: `{ok, data}` on success,
/// `{ok: false, error}` on rejection.
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub(crate) struct Envelope<T> {
    pub ok: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Server key material issued by the portal CA for one profile.
///
/// All fields are PEM-encoded except `tls_crypt`, which is an OpenVPN
/// static key blob shared with clients for control-channel protection.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateBundle {
    pub ca: String,
    pub certificate: String,
    pub private_key: String,
    pub tls_crypt: String,
}

/// Payload for the `connect` relay call.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectEvent {
    pub profile_id: String,
    pub common_name: String,
    pub ip4: String,
    pub ip6: String,
    pub connected_at: i64,
}

/// Payload for the `disconnect` relay call.
///
/// `disconnected_at` and `bytes_transferred` are derived by the caller from
/// the hook environment (`time_unix + time_duration`,
/// `bytes_received + bytes_sent`).
#[derive(Debug, Clone, Serialize)]
pub struct DisconnectEvent {
    pub profile_id: String,
    pub common_name: String,
    pub ip4: String,
    pub ip6: String,
    pub connected_at: i64,
    pub disconnected_at: i64,
    pub bytes_transferred: u64,
}
