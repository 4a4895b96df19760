//! CLI error types with miette diagnostics.
//!
//! Maps engine and config errors into user-facing errors with actionable
//! help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use vpnode_api::ApiError;
use vpnode_config::ConfigError;
use vpnode_core::CoreError;

/// Exit codes, stable for scripting.
pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFIG: i32 = 5;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("could not reach the portal")]
    #[diagnostic(
        code(vpnode::connection_failed),
        help(
            "Check that the portal is running and portal_url is correct.\n\
             Try: vpnode profiles --insecure"
        )
    )]
    ConnectionFailed {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("portal request timed out")]
    #[diagnostic(
        code(vpnode::timeout),
        help("Increase the timeout with --timeout or check portal responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────

    #[error("the portal rejected the API key")]
    #[diagnostic(
        code(vpnode::auth_failed),
        help("Verify the node API key matches the one registered at the portal.")
    )]
    AuthFailed,

    #[error("no portal API key configured")]
    #[diagnostic(
        code(vpnode::no_credentials),
        help(
            "Set api_key_file in the config, or export VPNODE_API_KEY.\n\
             Config file in effect: vpnode config path"
        )
    )]
    NoCredentials,

    // ── Resources ────────────────────────────────────────────────────

    #[error("profile '{id}' not found in the portal profile list")]
    #[diagnostic(
        code(vpnode::profile_not_found),
        help("Run: vpnode profiles --all to see what the portal offers")
    )]
    ProfileNotFound { id: String },

    // ── Portal / synthesis ───────────────────────────────────────────

    #[error("portal error: {message}")]
    #[diagnostic(code(vpnode::portal_error))]
    Portal { message: String },

    #[error("cannot synthesize configuration: {message}")]
    #[diagnostic(
        code(vpnode::synthesis),
        help("The profile or firewall definition is inconsistent; fix it at the source.")
    )]
    Synthesis { message: String },

    // ── Session hooks ────────────────────────────────────────────────

    #[error("hook environment variable '{key}' is missing")]
    #[diagnostic(
        code(vpnode::missing_env),
        help("connect/disconnect must be invoked by the OpenVPN hook, not by hand.")
    )]
    MissingEnv { key: &'static str },

    #[error("hook environment variable '{key}' is not a number")]
    #[diagnostic(code(vpnode::bad_env))]
    MalformedEnv { key: &'static str },

    // ── Configuration ────────────────────────────────────────────────

    #[error("invalid value for {field}: {reason}")]
    #[diagnostic(code(vpnode::validation))]
    Validation { field: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(vpnode::config))]
    Config(ConfigError),

    // ── IO ───────────────────────────────────────────────────────────

    #[error("failed to write {path}")]
    #[diagnostic(code(vpnode::write_failed))]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed | Self::NoCredentials => exit_code::AUTH,
            Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::MissingEnv { .. } | Self::MalformedEnv { .. } | Self::Validation { .. } => {
                exit_code::USAGE
            }
            Self::Config(_) => exit_code::CONFIG,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Lower-layer error mapping ────────────────────────────────────────

impl From<ApiError> for CliError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidApiKey => CliError::AuthFailed,
            ApiError::Transport(ref e) if e.is_timeout() => CliError::Timeout,
            ApiError::Transport(e) => CliError::ConnectionFailed { source: e.into() },
            other => CliError::Portal {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Remote(api) => api.into(),
            CoreError::ProfileNotFound { id } => CliError::ProfileNotFound { id },
            CoreError::Io { path, source } => CliError::WriteFailed {
                path: path.display().to_string(),
                source,
            },
            configuration => CliError::Synthesis {
                message: configuration.to_string(),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials => CliError::NoCredentials,
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            other => CliError::Config(other),
        }
    }
}
