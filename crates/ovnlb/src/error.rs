//! CLI error types with miette diagnostics.
//!
//! Maps config, client and core errors into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use ovnlb_config::ConfigError;
use ovnlb_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const CONFIG: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(
        code(ovnlb::config),
        help("Error parsing the configuration values. Please verify.")
    )]
    Config(ConfigError),

    #[error("No token configured for {service}")]
    #[diagnostic(
        code(ovnlb::no_credentials),
        help(
            "Set [{service}].token_env to an environment variable holding the token,\n\
             store it in the system keyring as ovnlb/{service}/token,\n\
             or set OVNLB_{service_env}__TOKEN."
        )
    )]
    NoCredentials { service: String, service_env: String },

    #[error("Invalid backend snapshot: {message}")]
    #[diagnostic(
        code(ovnlb::snapshot),
        help("Check [backend].snapshot points at a JSON dump of the backend tables.")
    )]
    Snapshot { message: String },

    // ── Connection ───────────────────────────────────────────────────
    #[error("TLS setup failed: {message}")]
    #[diagnostic(
        code(ovnlb::tls_error),
        help("Configure [sync].ca_cert, or set [sync].insecure for self-signed lab endpoints.")
    )]
    Tls { message: String },

    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(ovnlb::auth_failed),
        help("Verify the upstream and network tokens are valid and not expired.")
    )]
    AuthFailed { message: String },

    #[error("API error: {message}")]
    #[diagnostic(code(ovnlb::api_error))]
    Api { message: String },

    // ── Sync ─────────────────────────────────────────────────────────
    #[error("Sync aborted: {message}")]
    #[diagnostic(code(ovnlb::sync))]
    Sync { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Snapshot { .. } => exit_code::CONFIG,
            Self::NoCredentials { .. } | Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Tls { .. } => exit_code::CONNECTION,
            Self::Api { .. } | Self::Sync { .. } | Self::Io(_) => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { service } => CliError::NoCredentials {
                service_env: service.to_uppercase(),
                service,
            },
            other => CliError::Config(other),
        }
    }
}

impl From<ovnlb_api::Error> for CliError {
    fn from(err: ovnlb_api::Error) -> Self {
        match err {
            ovnlb_api::Error::Tls(message) => CliError::Tls { message },
            e @ ovnlb_api::Error::InvalidToken => CliError::AuthFailed {
                message: e.to_string(),
            },
            other => CliError::Api {
                message: other.to_string(),
            },
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Snapshot { message } => CliError::Snapshot { message },
            CoreError::Api {
                message,
                status: Some(401),
            } => CliError::AuthFailed { message },
            CoreError::Api { message, .. } => CliError::Api { message },
            other => CliError::Sync {
                message: other.to_string(),
            },
        }
    }
}
