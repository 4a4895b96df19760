//! Command dispatch: bridges CLI args -> engine calls -> output formatting.

pub mod config_cmd;
pub mod firewall_cmd;
pub mod generate;
pub mod profiles;
pub mod session;

use std::path::PathBuf;

use secrecy::SecretString;

use vpnode_api::PortalClient;
use vpnode_config::NodeConfig;
use vpnode_core::Provisioner;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a command to the appropriate handler.
pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Generate(args) => generate::handle(args, global).await,
        Command::Firewall(args) => firewall_cmd::handle(args, global).await,
        Command::Profiles(args) => profiles::handle(args, global).await,
        Command::Connect => session::connect(global).await,
        Command::Disconnect => session::disconnect(global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
        // Completions are handled before dispatch
        Command::Completions(_) => unreachable!(),
    }
}

// ── Shared construction helpers ──────────────────────────────────────

/// Load the node config and fold in CLI flag overrides.
pub(crate) fn load_node_config(global: &GlobalOpts) -> Result<NodeConfig, CliError> {
    let mut config = vpnode_config::load_config(global.config.as_deref())?;

    if let Some(ref portal) = global.portal {
        config.portal_url = portal.clone();
    }
    if global.insecure {
        config.insecure = true;
    }
    if let Some(timeout) = global.timeout {
        config.timeout = timeout;
    }

    vpnode_config::require_portal(&config)?;
    Ok(config)
}

/// Build a portal client from the resolved config and CLI flags.
pub(crate) fn portal_client(
    config: &NodeConfig,
    global: &GlobalOpts,
) -> Result<PortalClient, CliError> {
    let api_key = match global.api_key {
        Some(ref key) => SecretString::from(key.clone()),
        None => vpnode_config::resolve_api_key(config)?,
    };

    Ok(PortalClient::new(
        &config.portal_url,
        &api_key,
        &config.transport_config(),
    )?)
}

/// Build a provisioner, optionally overriding the output directory.
pub(crate) fn provisioner(
    config: &NodeConfig,
    global: &GlobalOpts,
    config_dir: Option<PathBuf>,
) -> Result<Provisioner, CliError> {
    let client = portal_client(config, global)?;
    Ok(Provisioner::new(
        client,
        config_dir.unwrap_or_else(|| config.config_dir.clone()),
        config.synthesizer_settings(),
    ))
}
