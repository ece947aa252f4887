// ── Member domain type ──

use super::field::Field;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Member {
    pub id: String,
    pub pool_id: String,
    pub address: Field<String>,
    pub protocol_port: Field<u16>,
    /// Resolved from the pool's load balancer when absent or empty.
    pub subnet_id: Field<String>,
    pub admin_state_up: Field<bool>,
    pub monitor_address: Field<String>,
    pub monitor_port: Field<u16>,
    pub weight: Field<u32>,
}
