//! Packet-filter rule synthesis in iptables-restore syntax.
//!
//! One document per address family, consuming the full profile list plus
//! the node's [`FirewallPolicy`]. Rule order is semantically meaningful to
//! a stateful loader: NAT table first, then the filter table with INPUT
//! before FORWARD, block rules ahead of accepts, terminal rejects last.
//! Output is deterministic for identical input; callers must not reorder.

use ipnet::IpNet;

use crate::error::CoreError;
use crate::model::{FirewallPolicy, ProfileDefinition};

/// Address family a rule document is generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InetFamily {
    V4,
    V6,
}

impl InetFamily {
    fn icmp(self) -> &'static str {
        match self {
            Self::V4 => "icmp",
            Self::V6 => "ipv6-icmp",
        }
    }

    fn reject_with(self) -> &'static str {
        match self {
            Self::V4 => "icmp-host-prohibited",
            Self::V6 => "icmp6-adm-prohibited",
        }
    }

    /// Whether forwarding is declared off for this profile and family.
    fn rejected_by(self, profile: &ProfileDefinition) -> bool {
        match self {
            Self::V4 => profile.reject4,
            Self::V6 => profile.reject6,
        }
    }

    fn range_of(self, profile: &ProfileDefinition) -> IpNet {
        match self {
            Self::V4 => IpNet::V4(profile.range.trunc()),
            Self::V6 => IpNet::V6(profile.range6.trunc()),
        }
    }
}

/// Build the full rule document as an ordered line sequence.
pub fn build(
    profiles: &[ProfileDefinition],
    policy: &FirewallPolicy,
    family: InetFamily,
) -> Result<Vec<String>, CoreError> {
    policy.validate()?;

    let mut rules: Vec<String> = [
        "*nat",
        ":PREROUTING ACCEPT [0:0]",
        ":INPUT ACCEPT [0:0]",
        ":OUTPUT ACCEPT [0:0]",
        ":POSTROUTING ACCEPT [0:0]",
    ]
    .map(str::to_owned)
    .into();
    rules.extend(nat_rules(profiles, family));
    rules.push("COMMIT".to_owned());

    rules.extend(
        [
            "*filter",
            ":INPUT ACCEPT [0:0]",
            ":FORWARD ACCEPT [0:0]",
            ":OUTPUT ACCEPT [0:0]",
        ]
        .map(str::to_owned),
    );
    rules.extend(input_chain(policy, family));
    rules.push("-A FORWARD -m state --state ESTABLISHED,RELATED -j ACCEPT".to_owned());
    rules.extend(forward_chain(profiles, family));
    rules.push(format!(
        "-A FORWARD -j REJECT --reject-with {}",
        family.reject_with()
    ));
    rules.push("COMMIT".to_owned());

    Ok(rules)
}

/// Newline-joined document form, equivalent to [`build`].
pub fn document(
    profiles: &[ProfileDefinition],
    policy: &FirewallPolicy,
    family: InetFamily,
) -> Result<String, CoreError> {
    let mut doc = build(profiles, policy, family)?.join("\n");
    doc.push('\n');
    Ok(doc)
}

fn nat_rules(profiles: &[ProfileDefinition], family: InetFamily) -> Vec<String> {
    profiles
        .iter()
        .filter(|p| p.use_nat)
        .map(|p| {
            // -i cannot be matched in POSTROUTING, only the source range
            format!(
                "-A POSTROUTING -s {} -o {} -j MASQUERADE",
                family.range_of(p),
                p.ext_if
            )
        })
        .collect()
}

fn input_chain(policy: &FirewallPolicy, family: InetFamily) -> Vec<String> {
    let mut chain = vec![
        "-A INPUT -m state --state ESTABLISHED,RELATED -j ACCEPT".to_owned(),
        format!("-A INPUT -p {} -j ACCEPT", family.icmp()),
        "-A INPUT -i lo -j ACCEPT".to_owned(),
    ];

    for trusted_if in &policy.trusted_interfaces {
        chain.push(format!("-A INPUT -i {trusted_if} -j ACCEPT"));
    }

    for (proto, port_list) in [("udp", &policy.udp_ports), ("tcp", &policy.tcp_ports)] {
        if port_list.is_empty() {
            continue;
        }
        chain.push(format!(
            "-A INPUT -m state --state NEW -m multiport -p {proto} --dports {} -j ACCEPT",
            port_list.join(",")
        ));
    }

    chain.push(format!(
        "-A INPUT -j REJECT --reject-with {}",
        family.reject_with()
    ));
    chain
}

fn forward_chain(profiles: &[ProfileDefinition], family: InetFamily) -> Vec<String> {
    let mut chain = vec![format!("-A FORWARD -p {} -j ACCEPT", family.icmp())];

    for profile in profiles {
        if family.rejected_by(profile) {
            continue;
        }

        let src_net = family.range_of(profile);
        let vpn_chain = profile.chain();

        chain.push(format!("-N {vpn_chain}"));
        chain.push(format!(
            "-A FORWARD -i {}+ -s {} -j {}",
            profile.device_prefix(),
            src_net,
            vpn_chain
        ));

        // block rules must precede the accepts below
        chain.extend(outbound_blocks(profile, family));

        if profile.client_to_client {
            chain.push(format!(
                "-A {} -o {}+ -d {} -j ACCEPT",
                vpn_chain,
                profile.device_prefix(),
                src_net
            ));
        }

        if profile.default_gateway {
            chain.push(format!("-A {} -o {} -j ACCEPT", vpn_chain, profile.ext_if));
        } else {
            for route in &profile.routes {
                let matches_family = matches!(
                    (family, route),
                    (InetFamily::V4, IpNet::V4(_)) | (InetFamily::V6, IpNet::V6(_))
                );
                if matches_family {
                    chain.push(format!(
                        "-A {} -o {} -d {} -j ACCEPT",
                        vpn_chain, profile.ext_if, route
                    ));
                }
            }
        }
    }

    chain
}

fn outbound_blocks(profile: &ProfileDefinition, family: InetFamily) -> Vec<String> {
    if !profile.block_smb {
        return Vec::new();
    }

    // outbound SMB over the tunnel leaks Windows credentials
    ["tcp", "udp"]
        .iter()
        .map(|proto| {
            format!(
                "-A {} -o {} -m multiport -p {proto} --dports 137:139,445 -j REJECT --reject-with {}",
                profile.chain(),
                profile.ext_if,
                family.reject_with()
            )
        })
        .collect()
}
