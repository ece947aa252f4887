// Shared transport configuration for building reqwest::Client instances.
//
// The upstream and network clients share TLS and timeout settings
// through this module, avoiding duplicated builder logic.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Header carrying the service token on every request.
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// TLS verification mode.
#[derive(Debug, Clone)]
pub enum TlsMode {
    /// Use the system certificate store.
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (lab deployments with self-signed endpoints).
    DangerAcceptInvalid,
}

/// Shared transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub tls: TlsMode,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            tls: TlsMode::System,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TlsMode {
    fn configure(&self, builder: reqwest::ClientBuilder) -> Result<reqwest::ClientBuilder, Error> {
        Ok(match self {
            Self::System => builder,
            Self::DangerAcceptInvalid => builder.danger_accept_invalid_certs(true),
            Self::CustomCa(path) => {
                let pem = std::fs::read(path).map_err(|e| {
                    Error::Tls(format!("cannot read CA bundle {}: {e}", path.display()))
                })?;
                let ca = reqwest::Certificate::from_pem(&pem)
                    .map_err(|e| Error::Tls(format!("CA bundle {} is not PEM: {e}", path.display())))?;
                builder.add_root_certificate(ca)
            }
        })
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` that sends `token` as `X-Auth-Token`.
    pub fn build_client_with_token(&self, token: &SecretString) -> Result<reqwest::Client, Error> {
        let mut value = HeaderValue::from_str(token.expose_secret())
            .map_err(|e| Error::Tls(format!("invalid auth token header value: {e}")))?;
        value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(HeaderName::from_static(AUTH_TOKEN_HEADER), value);

        let builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("ovnlb/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers);
        self.tls
            .configure(builder)?
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_transport_verifies_tls() {
        let cfg = TransportConfig::default();
        assert!(matches!(cfg.tls, TlsMode::System));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
    }

    #[test]
    fn missing_ca_file_is_a_tls_error() {
        let cfg = TransportConfig {
            tls: TlsMode::CustomCa("/nonexistent/ca.pem".into()),
            ..TransportConfig::default()
        };
        let token = SecretString::from("token".to_owned());
        let err = cfg.build_client_with_token(&token).unwrap_err();
        assert!(matches!(err, Error::Tls(_)), "got {err:?}");
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let cfg = TransportConfig::default();
        let token = SecretString::from("bad\ntoken".to_owned());
        assert!(cfg.build_client_with_token(&token).is_err());
    }

    #[test]
    fn insecure_mode_builds_client() {
        let cfg = TransportConfig {
            tls: TlsMode::DangerAcceptInvalid,
            ..TransportConfig::default()
        };
        let token = SecretString::from("token".to_owned());
        assert!(cfg.build_client_with_token(&token).is_ok());
    }
}
