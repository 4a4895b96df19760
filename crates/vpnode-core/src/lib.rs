//! Deterministic synthesis engine between `vpnode-api` and the CLI.
//!
//! This crate owns the domain model and every transformation that turns a
//! declarative profile list into load-bearing infrastructure text:
//!
//! - **[`cidr`]** — splits an IPv4/IPv6 range into equal, contiguous,
//!   non-overlapping sub-ranges, one per server process, plus the
//!   range-derived queries the renderers need (netmask, first host,
//!   usable host count).
//!
//! - **[`ports`]** — packs (instance, profile, process) coordinates into a
//!   collision-free management-port offset.
//!
//! - **[`proto`]** — resolves declared `proto/port` tokens into
//!   address-family-qualified OpenVPN transports.
//!
//! - **[`openvpn`]** — assembles the per-process server-configuration
//!   directive list. Output is byte-identical across runs for identical
//!   input: all non-header lines are byte-lexically sorted.
//!
//! - **[`firewall`]** — assembles iptables-restore rule documents from the
//!   same profile list plus a local [`FirewallPolicy`].
//!
//! - **[`Provisioner`]** — facade orchestrating portal fetches, synthesis,
//!   certificate issuance, and the permission-restricted file sink.
//!
//! Everything except the portal round trips and the sink writes is a pure
//! function over immutable input.

pub mod cidr;
pub mod error;
pub mod firewall;
pub mod model;
pub mod openvpn;
pub mod ports;
pub mod proto;
pub mod provision;
pub mod sink;

pub use error::CoreError;
pub use model::{FirewallPolicy, ProcessSlot, ProfileDefinition, TlsProtection};
pub use openvpn::{ConfigFile, SynthesizerSettings};
pub use provision::{FirewallDocuments, ProvisionSummary, Provisioner};
