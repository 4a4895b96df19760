//! `vpnode firewall` -- render iptables/ip6tables rule documents.

use std::path::Path;

use vpnode_core::sink;

use crate::cli::{Family, FirewallArgs, GlobalOpts};
use crate::error::CliError;

use super::{load_node_config, provisioner};

pub async fn handle(args: FirewallArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = load_node_config(global)?;
    let provisioner = provisioner(&config, global, None)?;

    let docs = provisioner
        .firewall_documents(&config.firewall_policy())
        .await?;

    if args.stdout {
        match args.family {
            Some(Family::V4) => print!("{}", docs.v4),
            Some(Family::V6) => print!("{}", docs.v6),
            None => print!("{}{}", docs.v4, docs.v6),
        }
        return Ok(());
    }

    let targets: Vec<(&Path, &str)> = match args.family {
        Some(Family::V4) => vec![(config.firewall.rules_v4.as_path(), docs.v4.as_str())],
        Some(Family::V6) => vec![(config.firewall.rules_v6.as_path(), docs.v6.as_str())],
        None => vec![
            (config.firewall.rules_v4.as_path(), docs.v4.as_str()),
            (config.firewall.rules_v6.as_path(), docs.v6.as_str()),
        ],
    };

    for (path, contents) in targets {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                sink::create_dir(parent)?;
            }
        }
        sink::write_file(path, contents)?;
        if !global.quiet {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
