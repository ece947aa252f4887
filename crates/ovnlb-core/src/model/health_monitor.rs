// ── Health monitor domain type ──

use super::field::Field;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HealthMonitor {
    pub id: String,
    pub pool_id: String,
    /// Raw type string, e.g. `TCP` or `UDP-CONNECT`.
    pub kind: Field<String>,
    /// Seconds between probes.
    pub delay: Field<u32>,
    pub timeout: Field<u32>,
    /// Consecutive successes before a member is marked healthy.
    pub max_retries: Field<u32>,
    /// Consecutive failures before a member is marked down.
    pub max_retries_down: Field<u32>,
    pub admin_state_up: Field<bool>,
}
