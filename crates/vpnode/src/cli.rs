//! Clap derive structures for the `vpnode` CLI.
//!
//! Defines the command tree, global flags, and shared enums.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vpnode -- provision OpenVPN server nodes from a portal profile list
#[derive(Debug, Parser)]
#[command(
    name = "vpnode",
    version,
    about = "Provision OpenVPN server nodes from a portal profile list",
    long_about = "Fetches profile definitions from the VPN portal and synthesizes\n\
        per-process OpenVPN server configurations, matching iptables rule\n\
        documents, and server key material. Also relays client connect and\n\
        disconnect events back to the portal.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Path to the node config file
    #[arg(long, short = 'c', env = "VPNODE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Portal node API base URL (overrides config)
    #[arg(long, env = "VPNODE_PORTAL_URL", global = true)]
    pub portal: Option<String>,

    /// Portal API key (overrides config)
    #[arg(long, env = "VPNODE_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format for inspection commands
    #[arg(long, short = 'o', env = "VPNODE_OUTPUT", default_value = "table", global = true)]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Accept self-signed portal TLS certificates
    #[arg(long, short = 'k', env = "VPNODE_INSECURE", global = true)]
    pub insecure: bool,

    /// Portal request timeout in seconds
    #[arg(long, env = "VPNODE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch profiles and write server configs plus key material
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Render iptables/ip6tables rule documents
    #[command(alias = "fw")]
    Firewall(FirewallArgs),

    /// List the portal's profile definitions
    Profiles(ProfilesArgs),

    /// Relay a client-connect event from the hook environment
    Connect,

    /// Relay a client-disconnect event from the hook environment
    Disconnect,

    /// Inspect the node configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── GENERATE ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Only write this profile id (default: all profiles)
    #[arg(long, short = 'p')]
    pub profile: Option<String>,

    /// Override the output directory for configs and key material
    #[arg(long)]
    pub config_dir: Option<PathBuf>,
}

// ── FIREWALL ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct FirewallArgs {
    /// Print the document(s) to stdout instead of writing files
    #[arg(long)]
    pub stdout: bool,

    /// Limit to one address family
    #[arg(long, value_enum)]
    pub family: Option<Family>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Family {
    #[value(name = "4")]
    V4,
    #[value(name = "6")]
    V6,
}

// ── PROFILES ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ProfilesArgs {
    /// Include profiles the portal marks as hidden
    #[arg(long, short = 'a')]
    pub all: bool,
}

// ── CONFIG ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the resolved configuration (key material redacted)
    Show,

    /// Print the config file path in effect
    Path,
}

// ── COMPLETIONS ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
