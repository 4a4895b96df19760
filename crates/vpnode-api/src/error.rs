use thiserror::Error;

/// Top-level error type for the `vpnode-api` crate.
///
/// Covers every failure mode of the portal round trips: transport,
/// authentication, envelope-level rejection, and payload decoding.
/// `vpnode-core` maps these into provisioning diagnostics.
#[derive(Debug, Error)]
pub enum ApiError {
    // ── Authentication ──────────────────────────────────────────────
    /// API key rejected by the portal.
    #[error("invalid API key")]
    InvalidApiKey,

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, …).
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Portal responses ────────────────────────────────────────────
    /// Non-success HTTP status from the portal.
    #[error("portal error (HTTP {status}): {message}")]
    Portal { status: u16, message: String },

    /// The portal answered 2xx but the envelope carried `ok: false`.
    #[error("request rejected by portal: {message}")]
    Rejected { message: String },

    /// JSON deserialization failed, with the raw body for debugging.
    #[error("deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// Envelope was well-formed but the expected `data` field was absent.
    #[error("portal response for '{call}' carried no data")]
    MissingData { call: &'static str },
}

impl ApiError {
    /// Returns `true` if this is a transient transport-level failure.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}
