//! Shared configuration for ovnlb tools.
//!
//! TOML file plus `OVNLB_`-prefixed environment, credential resolution
//! (env var, keyring, plaintext), and translation to
//! `ovnlb_core::DriverConfig` and `ovnlb_api::TransportConfig`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use ovnlb_api::{TlsMode, TransportConfig};
use ovnlb_core::{DEFAULT_LOOKUP_ATTEMPTS, DriverConfig};

/// Keyring service under which tokens are stored as `{service}/token`.
pub const KEYRING_SERVICE: &str = "ovnlb";

/// Environment prefix; nested keys use `__`, e.g. `OVNLB_SYNC__TIMEOUT`.
pub const ENV_PREFIX: &str = "OVNLB_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {service} URL configured")]
    NoEndpoint { service: String },

    #[error("no token configured for {service}")]
    NoCredentials { service: String },

    #[error("config file not found: {}", path.display())]
    Missing { path: PathBuf },

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    /// Load-balancing API holding the source of truth.
    #[serde(default)]
    pub upstream: Endpoint,

    /// Network API used for ports, subnets and floating IPs.
    #[serde(default)]
    pub network: Endpoint,

    #[serde(default)]
    pub backend: BackendSettings,

    #[serde(default)]
    pub sync: SyncSettings,
}

/// An API endpoint and its credentials.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Endpoint {
    /// Base URL, e.g. "https://lb.example.net:9876".
    pub url: Option<String>,

    /// Service token (plaintext, prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,
}

#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct BackendSettings {
    /// JSON snapshot of the control-plane database.
    pub snapshot: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SyncSettings {
    #[serde(default = "default_lookup_attempts")]
    pub lookup_attempts: u32,

    /// HTTP timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            lookup_attempts: default_lookup_attempts(),
            timeout: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_lookup_attempts() -> u32 {
    DEFAULT_LOOKUP_ATTEMPTS
}
fn default_timeout() -> u64 {
    30
}

impl Config {
    pub fn driver_config(&self) -> DriverConfig {
        DriverConfig {
            lookup_attempts: self.sync.lookup_attempts,
        }
    }

    /// `insecure` wins over a configured CA certificate.
    pub fn transport_config(&self) -> TransportConfig {
        let tls = if self.sync.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.sync.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.sync.timeout),
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "ovnlb", "ovnlb").map_or_else(
        || {
            let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
            p.push(".config");
            p.push("ovnlb");
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the config from file + environment.
///
/// An explicit `path` must exist; the default path may be absent, in which
/// case only defaults and environment apply.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = match path {
        Some(p) if !p.exists() => {
            return Err(ConfigError::Missing { path: p.to_path_buf() });
        }
        Some(p) => p.to_path_buf(),
        None => config_path(),
    };

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;

    if config.sync.lookup_attempts == 0 {
        return Err(ConfigError::Validation {
            field: "sync.lookup_attempts".into(),
            reason: "must be at least 1".into(),
        });
    }
    Ok(config)
}

// ── Endpoints & credentials ─────────────────────────────────────────

pub fn endpoint_url(endpoint: &Endpoint, service: &str) -> Result<Url, ConfigError> {
    let raw = endpoint
        .url
        .as_deref()
        .ok_or_else(|| ConfigError::NoEndpoint {
            service: service.into(),
        })?;
    raw.parse().map_err(|_| ConfigError::Validation {
        field: format!("{service}.url"),
        reason: format!("invalid URL: {raw}"),
    })
}

/// Resolve a service token from the credential chain.
pub fn resolve_token(endpoint: &Endpoint, service: &str) -> Result<SecretString, ConfigError> {
    // 1. Endpoint's token_env → env var lookup
    if let Some(ref env_name) = endpoint.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Ok(entry) = keyring::Entry::new(KEYRING_SERVICE, &format!("{service}/token")) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(ref token) = endpoint.token {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        service: service.into(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn defaults_without_file_sections() {
        let file = write_config("");
        let cfg = load_config(Some(file.path())).unwrap();

        assert_eq!(cfg.sync.lookup_attempts, DEFAULT_LOOKUP_ATTEMPTS);
        assert_eq!(cfg.sync.timeout, 30);
        assert!(cfg.backend.snapshot.is_none());
        assert!(matches!(cfg.transport_config().tls, TlsMode::System));
    }

    #[test]
    fn file_sections_are_read() {
        let file = write_config(
            r#"
            [upstream]
            url = "https://lb.example.net:9876"
            token = "up-secret"

            [network]
            url = "https://net.example.net:9696"

            [backend]
            snapshot = "/var/lib/ovnlb/nb.json"

            [sync]
            lookup_attempts = 5
            timeout = 10
            ca_cert = "/etc/ovnlb/ca.pem"
            "#,
        );
        let cfg = load_config(Some(file.path())).unwrap();

        assert_eq!(cfg.driver_config().lookup_attempts, 5);
        assert_eq!(
            endpoint_url(&cfg.upstream, "upstream").unwrap().as_str(),
            "https://lb.example.net:9876/"
        );
        assert_eq!(
            cfg.backend.snapshot.as_deref(),
            Some(Path::new("/var/lib/ovnlb/nb.json"))
        );

        let transport = cfg.transport_config();
        assert_eq!(transport.timeout, Duration::from_secs(10));
        assert!(matches!(transport.tls, TlsMode::CustomCa(_)));
    }

    #[test]
    fn insecure_overrides_ca_cert() {
        let cfg = Config {
            sync: SyncSettings {
                insecure: true,
                ca_cert: Some("/etc/ovnlb/ca.pem".into()),
                ..SyncSettings::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            cfg.transport_config().tls,
            TlsMode::DangerAcceptInvalid
        ));
    }

    #[test]
    fn zero_lookup_attempts_is_rejected() {
        let file = write_config("[sync]\nlookup_attempts = 0\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref field, .. } if field == "sync.lookup_attempts"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Missing { .. }));
    }

    #[test]
    fn malformed_file_is_a_figment_error() {
        let file = write_config("[sync]\nlookup_attempts = \"many\"\n");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Figment(_)));
    }

    #[test]
    fn endpoint_url_errors() {
        let missing = Endpoint::default();
        assert!(matches!(
            endpoint_url(&missing, "network").unwrap_err(),
            ConfigError::NoEndpoint { .. }
        ));

        let bad = Endpoint {
            url: Some("not a url".into()),
            ..Endpoint::default()
        };
        let err = endpoint_url(&bad, "network").unwrap_err();
        assert_eq!(err.to_string(), "invalid network.url: invalid URL: not a url");
    }

    #[test]
    fn token_from_env_var_named_in_config() {
        // PATH is always present in a test environment.
        let endpoint = Endpoint {
            token_env: Some("PATH".into()),
            token: Some("plaintext".into()),
            ..Endpoint::default()
        };
        let token = resolve_token(&endpoint, "upstream").unwrap();
        assert_eq!(token.expose_secret(), std::env::var("PATH").unwrap());
    }
}
