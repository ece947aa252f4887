// ── Core error types ──
//
// Driver-facing errors from ovnlb-core. Capability violations carry the
// exact message surfaced to the API caller. The `From<ovnlb_api::Error>`
// impl translates transport-layer errors into a single wrapped variant.

use thiserror::Error;

use crate::backend::BackendError;

/// Fallback text when a provisioning failure carries no message.
pub const UNKNOWN_DRIVER_ERROR: &str = "An unknown driver error occurred.";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Capability errors (user-facing, never retried) ───────────────
    #[error("{message}")]
    UnsupportedOption { message: String },

    #[error(
        "OVN provider does not support mixing IPv4/IPv6 configuration within the same Load Balancer."
    )]
    IpVersionMixing,

    // ── Provisioning ─────────────────────────────────────────────────
    #[error("{message}")]
    Driver { message: String },

    // ── Collaborators ────────────────────────────────────────────────
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },

    #[error("Change request applier is closed")]
    ApplierClosed,

    #[error("Invalid backend snapshot: {message}")]
    Snapshot { message: String },
}

impl CoreError {
    pub(crate) fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedOption {
            message: message.into(),
        }
    }

    /// Returns `true` for errors caused by the request itself rather than
    /// by a collaborator failing.
    pub fn is_user_fault(&self) -> bool {
        matches!(self, Self::UnsupportedOption { .. } | Self::IpVersionMixing)
    }
}

impl From<ovnlb_api::Error> for CoreError {
    fn from(err: ovnlb_api::Error) -> Self {
        let status = match &err {
            ovnlb_api::Error::Api { status, .. } => Some(*status),
            ovnlb_api::Error::InvalidToken => Some(401),
            _ => None,
        };
        CoreError::Api {
            message: err.to_string(),
            status,
        }
    }
}
