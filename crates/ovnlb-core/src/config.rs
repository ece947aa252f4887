// ── Driver configuration ──
//
// Runtime knobs for the driver. The core never reads config files;
// `ovnlb-config` builds this from TOML and environment.

use serde::{Deserialize, Serialize};

/// Lookups attempted before a load balancer or pool is considered absent.
pub const DEFAULT_LOOKUP_ATTEMPTS: u32 = 3;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverConfig {
    /// Bounded attempts for backend lookups racing in-flight creates.
    pub lookup_attempts: u32,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            lookup_attempts: DEFAULT_LOOKUP_ATTEMPTS,
        }
    }
}

impl DriverConfig {
    /// Attempt count clamped to at least one try.
    pub fn effective_attempts(&self) -> u32 {
        self.lookup_attempts.max(1)
    }
}
