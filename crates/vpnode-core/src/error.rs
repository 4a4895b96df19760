// ── Core error types ──
//
// Three families, matching how failures propagate: configuration errors
// (bad profile/policy data, fatal to the profile or run), remote errors
// (portal round trip failed), and IO errors (sink writes failed). None of
// these are retried inside the engine.

use std::path::PathBuf;

use thiserror::Error;

use vpnode_api::ApiError;

/// Unified error type for the synthesis engine.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration errors ─────────────────────────────────────────
    #[error("\"vpnProtoPorts\" must contain 1, 2, 4, 8, 16, 32 or 64 entries, got {count}")]
    InvalidProcessCount { count: usize },

    #[error("cannot split {range} into {count} parts: not a power of two")]
    InvalidPartitionCount { range: String, count: usize },

    #[error("cannot split {range} into {count} parts: prefix would exceed the address width")]
    RangeExhausted { range: String, count: usize },

    #[error("only \"tcp\" and \"udp\" are supported as protocols, got \"{proto}\"")]
    UnsupportedProtocol { proto: String },

    #[error("malformed proto/port token \"{token}\", expected e.g. \"udp/1194\"")]
    MalformedProtoPort { token: String },

    #[error("{field} {value} exceeds the management-port budget (max {max})")]
    PortBudgetExceeded {
        field: &'static str,
        value: u16,
        max: u16,
    },

    #[error("firewall {proto} port list has {count} entries, multiport allows at most {max}")]
    PortListTooLong {
        proto: &'static str,
        count: usize,
        max: usize,
    },

    #[error("profile \"{id}\" not found in the portal profile list")]
    ProfileNotFound { id: String },

    // ── Remote errors ────────────────────────────────────────────────
    #[error("portal request failed: {0}")]
    Remote(#[from] ApiError),

    // ── IO errors ────────────────────────────────────────────────────
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
