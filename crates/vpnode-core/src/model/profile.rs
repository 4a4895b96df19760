// ── Profile domain types ──
//
// `ProfileDefinition` mirrors the portal's JSON wire format (camelCase
// keys, profile map keyed by id). Defaults match what the portal omits for
// freshly created profiles.

use ipnet::{IpNet, Ipv4Net, Ipv6Net};
use serde::{Deserialize, Serialize};

use crate::proto::Transport;

/// TLS control-channel protection mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TlsProtection {
    #[default]
    #[serde(rename = "tls-crypt")]
    TlsCrypt,
    #[serde(rename = "tls-auth")]
    TlsAuth,
}

/// One VPN access policy, bound to one or more parallel server processes.
///
/// Immutable once loaded; a synthesis run consumes one snapshot of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDefinition {
    /// Injected from the portal map key, not part of the JSON body
    /// (but included when re-serializing for display).
    #[serde(skip_deserializing)]
    pub profile_id: String,

    /// Unique within an instance, 1-based.
    pub profile_number: u16,

    /// Unique across the deployment, 1-based.
    #[serde(default = "default_instance_number")]
    pub instance_number: u16,

    #[serde(default)]
    pub display_name: String,

    /// IPv4 client range, divided over the profile's processes.
    pub range: Ipv4Net,

    /// IPv6 client range, divided over the profile's processes.
    pub range6: Ipv6Net,

    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_management_ip")]
    pub management_ip: String,

    /// One `"proto/port"` token per server process.
    #[serde(default = "default_vpn_proto_ports")]
    pub vpn_proto_ports: Vec<String>,

    /// External interface clients egress through.
    pub ext_if: String,

    #[serde(default)]
    pub default_gateway: bool,
    #[serde(default)]
    pub client_to_client: bool,
    #[serde(default)]
    pub block_lan: bool,
    #[serde(default)]
    pub block_smb: bool,
    #[serde(default)]
    pub enable_log: bool,
    #[serde(default)]
    pub use_nat: bool,
    #[serde(default)]
    pub reject4: bool,
    #[serde(default)]
    pub reject6: bool,
    #[serde(default)]
    pub tls_protection: TlsProtection,
    #[serde(default)]
    pub two_factor: bool,

    /// Split-tunnel routes pushed when this is not a default gateway.
    #[serde(default)]
    pub routes: Vec<IpNet>,

    /// DNS resolvers to push; `@GW4@` / `@GW6@` expand to the first host
    /// of the process slot's range.
    #[serde(default)]
    pub dns: Vec<String>,

    #[serde(default)]
    pub hide_profile: bool,
}

fn default_instance_number() -> u16 {
    1
}

fn default_listen() -> String {
    "::".into()
}

fn default_management_ip() -> String {
    "127.0.0.1".into()
}

fn default_vpn_proto_ports() -> Vec<String> {
    vec!["udp/1194".into(), "tcp/1194".into()]
}

impl ProfileDefinition {
    /// Number of parallel server processes, one per proto/port token.
    pub fn process_count(&self) -> usize {
        self.vpn_proto_ports.len()
    }

    /// Tunnel device name for one process slot.
    pub fn device(&self, process: usize) -> String {
        format!(
            "tun-{}-{}-{}",
            self.instance_number, self.profile_number, process
        )
    }

    /// Interface prefix matching every tunnel device of this profile.
    ///
    /// The trailing `-` keeps an iptables `+` wildcard from also matching
    /// profiles whose number merely starts with the same digits.
    pub fn device_prefix(&self) -> String {
        format!("tun-{}-{}-", self.instance_number, self.profile_number)
    }

    /// Dedicated FORWARD chain name for this profile.
    pub fn chain(&self) -> String {
        format!("vpn-{}-{}", self.instance_number, self.profile_number)
    }

    /// Output file name for one process slot.
    pub fn config_name(&self, process: usize) -> String {
        format!("{}-{}.conf", self.profile_id, process)
    }
}

/// One server process within a profile: its address slices, transport, and
/// derived names. Recomputed fresh on every synthesis run, never persisted.
#[derive(Debug, Clone)]
pub struct ProcessSlot {
    pub index: usize,
    pub range: Ipv4Net,
    pub range6: Ipv6Net,
    pub dev: String,
    pub transport: Transport,
    pub port: u16,
    pub management_port: u16,
    pub config_name: String,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn parse(body: &str) -> ProfileDefinition {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn minimal_profile_gets_defaults() {
        let profile = parse(
            r#"{
                "profileNumber": 1,
                "range": "10.42.42.0/24",
                "range6": "fd00:4242:4242::/48",
                "extIf": "eth0"
            }"#,
        );

        assert_eq!(profile.instance_number, 1);
        assert_eq!(profile.listen, "::");
        assert_eq!(profile.management_ip, "127.0.0.1");
        assert_eq!(profile.vpn_proto_ports, ["udp/1194", "tcp/1194"]);
        assert_eq!(profile.tls_protection, TlsProtection::TlsCrypt);
        assert!(!profile.default_gateway);
        assert!(!profile.hide_profile);
        assert!(profile.routes.is_empty());
    }

    #[test]
    fn camel_case_flags_round_trip() {
        let profile = parse(
            r#"{
                "profileNumber": 3,
                "instanceNumber": 2,
                "range": "10.0.0.0/20",
                "range6": "fd00::/48",
                "extIf": "ens3",
                "defaultGateway": true,
                "blockSmb": true,
                "tlsProtection": "tls-auth",
                "twoFactor": true,
                "dns": ["@GW4@", "9.9.9.9"]
            }"#,
        );

        assert!(profile.default_gateway);
        assert!(profile.block_smb);
        assert!(profile.two_factor);
        assert_eq!(profile.tls_protection, TlsProtection::TlsAuth);
        assert_eq!(profile.dns, ["@GW4@", "9.9.9.9"]);
        assert_eq!(profile.ext_if, "ens3");
    }

    #[test]
    fn derived_names() {
        let mut profile = parse(
            r#"{
                "profileNumber": 2,
                "instanceNumber": 1,
                "range": "10.0.0.0/24",
                "range6": "fd00::/48",
                "extIf": "eth0"
            }"#,
        );
        profile.profile_id = "office".into();

        assert_eq!(profile.device(0), "tun-1-2-0");
        assert_eq!(profile.device_prefix(), "tun-1-2-");
        assert_eq!(profile.chain(), "vpn-1-2");
        assert_eq!(profile.config_name(1), "office-1.conf");
    }
}
