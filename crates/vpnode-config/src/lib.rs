//! Node configuration for vpnode.
//!
//! TOML file + `VPNODE_`-prefixed environment overrides, credential
//! resolution (env var → key file → plaintext), and translation into the
//! engine's settings types. The binary is the only consumer; the crate
//! exists so config parsing stays testable without a CLI.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use vpnode_api::{TlsMode, TransportConfig};
use vpnode_core::{FirewallPolicy, SynthesizerSettings};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no portal API key configured (set api_key, api_key_file, or api_key_env)")]
    NoCredentials,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level node configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Base URL of the portal's node API.
    pub portal_url: String,

    /// Plaintext API key (prefer `api_key_file` or `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    pub api_key_env: Option<String>,

    /// File containing the API key (trailing whitespace ignored).
    pub api_key_file: Option<PathBuf>,

    /// Where generated server configs and key material land.
    pub config_dir: PathBuf,

    /// Unprivileged user/group the daemons drop to.
    pub vpn_user: String,
    pub vpn_group: String,

    /// Directory holding the connect/disconnect/otp hook executables.
    pub libexec_dir: PathBuf,

    /// Portal request timeout in seconds.
    pub timeout: u64,

    /// Accept self-signed portal certificates.
    pub insecure: bool,

    /// Custom CA certificate for the portal connection.
    pub ca_cert: Option<PathBuf>,

    pub firewall: FirewallSection,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            portal_url: String::new(),
            api_key: None,
            api_key_env: None,
            api_key_file: None,
            config_dir: PathBuf::from("openvpn-config"),
            vpn_user: "nobody".into(),
            vpn_group: "nogroup".into(),
            libexec_dir: PathBuf::from("/usr/libexec/vpnode"),
            timeout: 30,
            insecure: false,
            ca_cert: None,
            firewall: FirewallSection::default(),
        }
    }
}

/// Firewall policy plus output locations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FirewallSection {
    pub trusted_interfaces: Vec<String>,
    pub udp_ports: Vec<String>,
    pub tcp_ports: Vec<String>,
    pub rules_v4: PathBuf,
    pub rules_v6: PathBuf,
}

impl Default for FirewallSection {
    fn default() -> Self {
        let policy = FirewallPolicy::default();
        Self {
            trusted_interfaces: policy.trusted_interfaces,
            udp_ports: policy.udp_ports,
            tcp_ports: policy.tcp_ports,
            rules_v4: PathBuf::from("firewall/iptables.rules"),
            rules_v6: PathBuf::from("firewall/ip6tables.rules"),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "vpnode", "vpnode").map_or_else(
        || PathBuf::from("/etc/vpnode/config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the node config from defaults, the TOML file, and the environment.
///
/// `file` overrides the canonical path; a missing file just yields the
/// defaults (the environment can carry everything).
pub fn load_config(file: Option<&Path>) -> Result<NodeConfig, ConfigError> {
    let path = file.map_or_else(config_path, Path::to_path_buf);

    let figment = Figment::new()
        .merge(Serialized::defaults(NodeConfig::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("VPNODE_"));

    let config: NodeConfig = figment.extract()?;
    Ok(config)
}

/// Render the resolved config as pretty TOML (for `config show`).
pub fn to_toml(config: &NodeConfig) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

/// Validate the parts every portal-bound command needs.
pub fn require_portal(config: &NodeConfig) -> Result<(), ConfigError> {
    if config.portal_url.is_empty() {
        return Err(ConfigError::Validation {
            field: "portal_url".into(),
            reason: "must be set to the portal's node API base URL".into(),
        });
    }
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

/// Resolve the portal API key: named env var, then key file, then the
/// plaintext config value.
pub fn resolve_api_key(config: &NodeConfig) -> Result<SecretString, ConfigError> {
    if let Some(ref env_name) = config.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    if let Some(ref key_file) = config.api_key_file {
        let raw = std::fs::read_to_string(key_file)?;
        return Ok(SecretString::from(raw.trim_end().to_owned()));
    }

    if let Some(ref key) = config.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials)
}

// ── Engine settings translation ─────────────────────────────────────

impl NodeConfig {
    pub fn transport_config(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            timeout: std::time::Duration::from_secs(self.timeout),
        }
    }

    pub fn synthesizer_settings(&self) -> SynthesizerSettings {
        SynthesizerSettings {
            vpn_user: self.vpn_user.clone(),
            vpn_group: self.vpn_group.clone(),
            libexec_dir: self.libexec_dir.clone(),
        }
    }

    pub fn firewall_policy(&self) -> FirewallPolicy {
        FirewallPolicy {
            trusted_interfaces: self.firewall.trusted_interfaces.clone(),
            udp_ports: self.firewall.udp_ports.clone(),
            tcp_ports: self.firewall.tcp_ports.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::io::Write;

    use super::*;

    fn write_config(contents: &str) -> (tempfile::TempDir, PathBuf) {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::File::create(&path)
            .unwrap()
            .write_all(contents.as_bytes())
            .unwrap();
        (tmp, path)
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.vpn_user, "nobody");
        assert_eq!(config.timeout, 30);
        assert_eq!(config.firewall.udp_ports, ["1194"]);
        assert!(require_portal(&config).is_err());
    }

    #[test]
    fn file_values_override_defaults() {
        let (_tmp, path) = write_config(
            r#"
                portal_url = "https://portal.example.org/vpn-server-api"
                vpn_user = "openvpn"
                vpn_group = "openvpn"
                timeout = 10

                [firewall]
                trusted_interfaces = ["eth1"]
                udp_ports = ["1194", "1195"]
            "#,
        );

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.portal_url, "https://portal.example.org/vpn-server-api");
        assert_eq!(config.vpn_user, "openvpn");
        assert_eq!(config.timeout, 10);
        assert_eq!(config.firewall.trusted_interfaces, ["eth1"]);
        assert_eq!(config.firewall.udp_ports, ["1194", "1195"]);
        // untouched section keeps defaults
        assert_eq!(config.firewall.rules_v4, PathBuf::from("firewall/iptables.rules"));
        assert!(require_portal(&config).is_ok());
    }

    #[test]
    fn api_key_file_wins_over_plaintext() {
        let tmp = tempfile::tempdir().unwrap();
        let key_path = tmp.path().join("node-api.key");
        std::fs::write(&key_path, "file-key\n").unwrap();

        let config = NodeConfig {
            api_key: Some("plain-key".into()),
            api_key_file: Some(key_path),
            ..NodeConfig::default()
        };

        use secrecy::ExposeSecret;
        let key = resolve_api_key(&config).unwrap();
        assert_eq!(key.expose_secret(), "file-key");
    }

    #[test]
    fn plaintext_key_is_the_fallback() {
        let config = NodeConfig {
            api_key: Some("plain-key".into()),
            ..NodeConfig::default()
        };

        use secrecy::ExposeSecret;
        assert_eq!(resolve_api_key(&config).unwrap().expose_secret(), "plain-key");
    }

    #[test]
    fn no_key_anywhere_is_an_error() {
        assert!(matches!(
            resolve_api_key(&NodeConfig::default()),
            Err(ConfigError::NoCredentials)
        ));
    }

    #[test]
    fn settings_translation() {
        let config = NodeConfig {
            insecure: true,
            vpn_user: "openvpn".into(),
            ..NodeConfig::default()
        };

        assert!(matches!(
            config.transport_config().tls,
            TlsMode::DangerAcceptInvalid
        ));
        assert_eq!(config.synthesizer_settings().vpn_user, "openvpn");
        assert_eq!(config.firewall_policy().udp_ports, ["1194"]);
    }
}
