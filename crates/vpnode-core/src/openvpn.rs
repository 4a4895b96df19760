//! OpenVPN server-configuration synthesis.
//!
//! One config file per (profile, process). The directive list is assembled
//! from a fixed static block plus conditional blocks, then every non-header
//! line is sorted byte-lexically. The sort scatters logically related
//! directives, but it makes two runs over identical input byte-identical
//! regardless of generation order; downstream output-compatibility checks
//! rely on that. Only the generated-file header stays unsorted on top.

use std::path::PathBuf;

use ipnet::IpNet;

use crate::cidr;
use crate::error::CoreError;
use crate::model::{ProcessSlot, ProfileDefinition, TlsProtection};
use crate::ports;
use crate::proto;

/// Process counts the address partitioning and port budget support.
pub const ALLOWED_PROCESS_COUNTS: [usize; 7] = [1, 2, 4, 8, 16, 32, 64];

const GENERATED_HEADER: [&str; 7] = [
    "#",
    "# OpenVPN Server Configuration",
    "#",
    "# ******************************************",
    "# * THIS FILE IS GENERATED, DO NOT MODIFY! *",
    "# ******************************************",
    "#",
];

/// Node-local values injected into every rendered config.
#[derive(Debug, Clone)]
pub struct SynthesizerSettings {
    /// Unprivileged user the daemon drops to after startup.
    pub vpn_user: String,
    /// Unprivileged group the daemon drops to after startup.
    pub vpn_group: String,
    /// Directory holding the client-connect / client-disconnect /
    /// verify-otp hook executables.
    pub libexec_dir: PathBuf,
}

impl Default for SynthesizerSettings {
    fn default() -> Self {
        Self {
            vpn_user: "nobody".into(),
            vpn_group: "nogroup".into(),
            libexec_dir: PathBuf::from("/usr/libexec/vpnode"),
        }
    }
}

/// A rendered configuration file, not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub name: String,
    pub contents: String,
}

/// Derive the process slots for a profile: address slices, transports,
/// management ports, and names, in process-index order.
///
/// Fails fast before anything is rendered: an invalid process count, an
/// unresolvable proto/port token, or an exhausted range aborts the whole
/// profile.
pub fn process_slots(profile: &ProfileDefinition) -> Result<Vec<ProcessSlot>, CoreError> {
    let process_count = profile.process_count();
    if !ALLOWED_PROCESS_COUNTS.contains(&process_count) {
        return Err(CoreError::InvalidProcessCount {
            count: process_count,
        });
    }

    let slices4 = cidr::split4(profile.range, process_count)?;
    let slices6 = cidr::split6(profile.range6, process_count)?;

    let mut slots = Vec::with_capacity(process_count);
    for (index, (range, range6)) in slices4.into_iter().zip(slices6).enumerate() {
        let (transport, port) = proto::resolve(&profile.vpn_proto_ports[index], &profile.listen)?;
        let management_port = ports::management_port(
            profile.instance_number,
            profile.profile_number,
            u16::try_from(index).unwrap_or(u16::MAX),
        )?;

        slots.push(ProcessSlot {
            index,
            range,
            range6,
            dev: profile.device(index),
            transport,
            port,
            management_port,
            config_name: profile.config_name(index),
        });
    }
    Ok(slots)
}

/// Render every process config for one profile, in process-index order.
pub fn synthesize(
    profile: &ProfileDefinition,
    settings: &SynthesizerSettings,
) -> Result<Vec<ConfigFile>, CoreError> {
    let slots = process_slots(profile)?;
    Ok(slots
        .iter()
        .map(|slot| ConfigFile {
            name: slot.config_name.clone(),
            contents: render_process(profile, slot, settings),
        })
        .collect())
}

fn render_process(
    profile: &ProfileDefinition,
    slot: &ProcessSlot,
    settings: &SynthesizerSettings,
) -> String {
    let tls_dir = format!("tls/{}", profile.profile_id);
    let libexec = settings.libexec_dir.display();

    let mut lines = vec![
        "verb 3".to_owned(),
        "dev-type tun".to_owned(),
        format!("user {}", settings.vpn_user),
        format!("group {}", settings.vpn_group),
        "topology subnet".to_owned(),
        "persist-key".to_owned(),
        "persist-tun".to_owned(),
        "remote-cert-tls client".to_owned(),
        "tls-version-min 1.2".to_owned(),
        "tls-cipher TLS-ECDHE-RSA-WITH-AES-256-GCM-SHA384".to_owned(),
        // ECDHE and AES-256-GCM only
        "dh none".to_owned(),
        "ncp-ciphers AES-256-GCM".to_owned(),
        "cipher AES-256-GCM".to_owned(),
        "auth none".to_owned(),
        format!("client-connect {libexec}/client-connect"),
        format!("client-disconnect {libexec}/client-disconnect"),
        format!("ca {tls_dir}/ca.crt"),
        format!("cert {tls_dir}/server.crt"),
        format!("key {tls_dir}/server.key"),
        format!("server {} {}", slot.range.network(), slot.range.netmask()),
        format!("server-ipv6 {}", cidr::addr_prefix6(slot.range6)),
        format!("max-clients {}", cidr::usable_hosts4(slot.range).saturating_sub(1)),
        "script-security 2".to_owned(),
        format!("dev {}", slot.dev),
        format!("port {}", slot.port),
        format!("management {} {}", profile.management_ip, slot.management_port),
        format!("setenv PROFILE_ID {}", profile.profile_id),
        format!("proto {}", slot.transport),
        format!("local {}", profile.listen),
    ];

    if !profile.enable_log {
        lines.push("log /dev/null".to_owned());
    }

    if slot.transport.is_tcp() {
        lines.push("tcp-nodelay".to_owned());
    }

    if slot.transport.is_udp() {
        // have clients reconnect to the same process when it restarts,
        // and tell us when they leave
        lines.push("keepalive 10 60".to_owned());
        lines.push("explicit-exit-notify 1".to_owned());
        lines.push("push \"explicit-exit-notify 1\"".to_owned());
    }

    if profile.two_factor {
        lines.push("auth-gen-token".to_owned());
        lines.push(format!("auth-user-pass-verify {libexec}/verify-otp via-env"));
    }

    match profile.tls_protection {
        TlsProtection::TlsCrypt => lines.push(format!("tls-crypt {tls_dir}/tls-crypt.key")),
        TlsProtection::TlsAuth => lines.push(format!("tls-auth {tls_dir}/ta.key 0")),
    }

    lines.extend(route_lines(profile));
    lines.extend(dns_lines(profile, slot));
    lines.extend(client_to_client_lines(profile));

    // byte order, not insertion order: the determinism device
    lines.sort();

    let mut doc: Vec<String> = GENERATED_HEADER.iter().map(|s| (*s).to_owned()).collect();
    doc.extend(lines);

    let mut contents = doc.join("\n");
    contents.push('\n');
    contents
}

fn route_lines(profile: &ProfileDefinition) -> Vec<String> {
    if profile.default_gateway {
        let mut flags = vec!["def1", "ipv6"];
        if profile.block_lan {
            flags.push("block-local");
        }
        return vec![
            format!("push \"redirect-gateway {}\"", flags.join(" ")),
            "push \"route-ipv6 ::/0\"".to_owned(),
        ];
    }

    // Always route the remote host through the client's original gateway,
    // so a pushed range containing the server's public address cannot loop
    // tunnel traffic back into the tunnel.
    let mut routes = vec!["push \"route remote_host 255.255.255.255 net_gateway\"".to_owned()];
    for route in &profile.routes {
        match route {
            IpNet::V4(r) => routes.push(format!("push \"route {} {}\"", r.network(), r.netmask())),
            IpNet::V6(r) => routes.push(format!("push \"route-ipv6 {}\"", cidr::addr_prefix6(*r))),
        }
    }
    routes
}

fn dns_lines(profile: &ProfileDefinition, slot: &ProcessSlot) -> Vec<String> {
    let mut entries = Vec::new();
    if profile.default_gateway {
        // prevent DNS leakage on Windows when the VPN is the default gateway
        entries.push("push \"block-outside-dns\"".to_owned());
    }
    for dns in &profile.dns {
        let addr = match dns.as_str() {
            "@GW4@" => cidr::first_host4(slot.range).to_string(),
            "@GW6@" => cidr::first_host6(slot.range6).to_string(),
            other => other.to_owned(),
        };
        entries.push(format!("push \"dhcp-option DNS {addr}\""));
    }
    entries
}

fn client_to_client_lines(profile: &ProfileDefinition) -> Vec<String> {
    if !profile.client_to_client {
        return Vec::new();
    }
    vec![
        "client-to-client".to_owned(),
        format!(
            "push \"route {} {}\"",
            profile.range.network(),
            profile.range.netmask()
        ),
        format!("push \"route-ipv6 {}\"", cidr::addr_prefix6(profile.range6)),
    ]
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn test_profile() -> ProfileDefinition {
        let mut profile: ProfileDefinition = serde_json::from_str(
            r#"{
                "profileNumber": 1,
                "instanceNumber": 1,
                "range": "10.42.42.0/25",
                "range6": "fd00:4242:4242::/48",
                "listen": "::",
                "extIf": "eth0",
                "vpnProtoPorts": ["udp/1194", "tcp/1194"],
                "defaultGateway": true,
                "dns": ["@GW4@", "@GW6@"]
            }"#,
        )
        .unwrap();
        profile.profile_id = "internet".into();
        profile
    }

    fn lines(file: &ConfigFile) -> Vec<&str> {
        file.contents.lines().collect()
    }

    #[test]
    fn two_processes_yield_two_files_in_index_order() {
        let files = synthesize(&test_profile(), &SynthesizerSettings::default()).unwrap();
        assert_eq!(files.len(), 2);
        assert_eq!(files[0].name, "internet-0.conf");
        assert_eq!(files[1].name, "internet-1.conf");
    }

    #[test]
    fn end_to_end_scenario() {
        let files = synthesize(&test_profile(), &SynthesizerSettings::default()).unwrap();
        let udp = &files[0].contents;
        let tcp = &files[1].contents;

        // full-tunnel redirect and DNS-leak prevention in both
        for contents in [udp, tcp] {
            assert!(contents.contains("push \"redirect-gateway def1 ipv6\""));
            assert!(contents.contains("push \"route-ipv6 ::/0\""));
            assert!(contents.contains("push \"block-outside-dns\""));
        }

        // transport-specific blocks
        assert!(udp.contains("proto udp6"));
        assert!(udp.contains("keepalive 10 60"));
        assert!(udp.contains("explicit-exit-notify 1"));
        assert!(!udp.contains("tcp-nodelay"));

        assert!(tcp.contains("proto tcp6-server"));
        assert!(tcp.contains("tcp-nodelay"));
        assert!(!tcp.contains("keepalive"));

        // device names carry profile number and process index
        assert!(udp.contains("dev tun-1-1-0"));
        assert!(tcp.contains("dev tun-1-1-1"));
    }

    #[test]
    fn output_is_deterministic() {
        let profile = test_profile();
        let settings = SynthesizerSettings::default();
        assert_eq!(
            synthesize(&profile, &settings).unwrap(),
            synthesize(&profile, &settings).unwrap()
        );
    }

    #[test]
    fn non_header_lines_are_byte_sorted() {
        let files = synthesize(&test_profile(), &SynthesizerSettings::default()).unwrap();
        let all = lines(&files[0]);
        let (header, body) = all.split_at(GENERATED_HEADER.len());
        assert_eq!(header, &GENERATED_HEADER[..]);

        let mut sorted = body.to_vec();
        sorted.sort_unstable();
        assert_eq!(body, sorted);
    }

    #[test]
    fn address_slices_feed_server_directives() {
        let files = synthesize(&test_profile(), &SynthesizerSettings::default()).unwrap();

        // /25 split in two: each process serves a /26 (62 hosts, one is ours)
        assert!(files[0]
            .contents
            .contains("server 10.42.42.0 255.255.255.192"));
        assert!(files[1]
            .contents
            .contains("server 10.42.42.64 255.255.255.192"));
        assert!(files[0].contents.contains("server-ipv6 fd00:4242:4242::/49"));
        assert!(files[1]
            .contents
            .contains("server-ipv6 fd00:4242:4242:8000::/49"));
        assert!(files[0].contents.contains("max-clients 61"));

        // gateway macros expand to the slice's first host
        assert!(files[0]
            .contents
            .contains("push \"dhcp-option DNS 10.42.42.1\""));
        assert!(files[1]
            .contents
            .contains("push \"dhcp-option DNS 10.42.42.65\""));
        assert!(files[0]
            .contents
            .contains("push \"dhcp-option DNS fd00:4242:4242::1\""));
    }

    #[test]
    fn management_ports_follow_process_index() {
        let files = synthesize(&test_profile(), &SynthesizerSettings::default()).unwrap();
        assert!(files[0].contents.contains("management 127.0.0.1 11940"));
        assert!(files[1].contents.contains("management 127.0.0.1 11941"));
    }

    #[test]
    fn invalid_process_count_fails_before_rendering() {
        let mut profile = test_profile();
        profile.vpn_proto_ports = vec!["udp/1194".into(), "udp/1195".into(), "udp/1196".into()];
        assert!(matches!(
            synthesize(&profile, &SynthesizerSettings::default()),
            Err(CoreError::InvalidProcessCount { count: 3 })
        ));
    }

    #[test]
    fn split_tunnel_profile_pushes_explicit_routes() {
        let mut profile = test_profile();
        profile.default_gateway = false;
        profile.routes = vec![
            "192.0.2.0/24".parse().unwrap(),
            "2001:db8::/32".parse().unwrap(),
        ];

        let files = synthesize(&profile, &SynthesizerSettings::default()).unwrap();
        let contents = &files[0].contents;

        assert!(contents.contains("push \"route remote_host 255.255.255.255 net_gateway\""));
        assert!(contents.contains("push \"route 192.0.2.0 255.255.255.0\""));
        assert!(contents.contains("push \"route-ipv6 2001:db8::/32\""));
        assert!(!contents.contains("redirect-gateway"));
        assert!(!contents.contains("block-outside-dns"));
    }

    #[test]
    fn block_lan_extends_redirect_flags() {
        let mut profile = test_profile();
        profile.block_lan = true;
        let files = synthesize(&profile, &SynthesizerSettings::default()).unwrap();
        assert!(files[0]
            .contents
            .contains("push \"redirect-gateway def1 ipv6 block-local\""));
    }

    #[test]
    fn two_factor_adds_verify_hook() {
        let mut profile = test_profile();
        profile.two_factor = true;
        let files = synthesize(&profile, &SynthesizerSettings::default()).unwrap();
        assert!(files[0].contents.contains("auth-gen-token"));
        assert!(files[0]
            .contents
            .contains("auth-user-pass-verify /usr/libexec/vpnode/verify-otp via-env"));
    }

    #[test]
    fn tls_auth_mode_swaps_keying_directive() {
        let mut profile = test_profile();
        profile.tls_protection = TlsProtection::TlsAuth;
        let files = synthesize(&profile, &SynthesizerSettings::default()).unwrap();
        assert!(files[0].contents.contains("tls-auth tls/internet/ta.key 0"));
        assert!(!files[0].contents.contains("tls-crypt "));
    }

    #[test]
    fn client_to_client_pushes_full_ranges() {
        let mut profile = test_profile();
        profile.client_to_client = true;
        let files = synthesize(&profile, &SynthesizerSettings::default()).unwrap();
        let contents = &files[0].contents;
        assert!(contents.contains("client-to-client"));
        assert!(contents.contains("push \"route 10.42.42.0 255.255.255.128\""));
        assert!(contents.contains("push \"route-ipv6 fd00:4242:4242::/48\""));
    }

    #[test]
    fn logging_disabled_discards_log() {
        let files = synthesize(&test_profile(), &SynthesizerSettings::default()).unwrap();
        assert!(files[0].contents.contains("log /dev/null"));

        let mut profile = test_profile();
        profile.enable_log = true;
        let files = synthesize(&profile, &SynthesizerSettings::default()).unwrap();
        assert!(!files[0].contents.contains("log /dev/null"));
    }
}
