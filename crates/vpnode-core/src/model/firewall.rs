// ── Firewall policy ──
//
// Node-local inbound policy, configured alongside the node (not fetched
// from the portal): which interfaces are trusted outright and which
// destination ports accept new connections.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Hard limit of the iptables multiport match; a `lo:hi` range counts as
/// two entries, so the real ceiling can be lower still.
pub const MULTIPORT_MAX: usize = 15;

/// Inbound policy for the INPUT chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirewallPolicy {
    /// Interfaces whose traffic is accepted without port filtering.
    pub trusted_interfaces: Vec<String>,

    /// UDP destination ports (or `lo:hi` ranges) accepting new connections.
    pub udp_ports: Vec<String>,

    /// TCP destination ports (or `lo:hi` ranges) accepting new connections.
    pub tcp_ports: Vec<String>,
}

impl Default for FirewallPolicy {
    fn default() -> Self {
        Self {
            trusted_interfaces: Vec::new(),
            udp_ports: vec!["1194".into()],
            tcp_ports: vec!["22".into(), "80".into(), "443".into(), "1194".into()],
        }
    }
}

impl FirewallPolicy {
    /// Reject port lists the multiport match cannot express.
    pub fn validate(&self) -> Result<(), CoreError> {
        for (proto, list) in [("udp", &self.udp_ports), ("tcp", &self.tcp_ports)] {
            if list.len() > MULTIPORT_MAX {
                return Err(CoreError::PortListTooLong {
                    proto,
                    count: list.len(),
                    max: MULTIPORT_MAX,
                });
            }
        }
        Ok(())
    }
}
