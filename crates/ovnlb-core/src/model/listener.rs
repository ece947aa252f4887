// ── Listener domain type ──

use super::field::Field;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listener {
    pub id: String,
    pub loadbalancer_id: Field<String>,
    pub protocol: Field<String>,
    pub protocol_port: Field<u16>,
    pub default_pool_id: Field<String>,
    pub admin_state_up: Field<bool>,
    /// Source CIDR allow-list. The backend cannot enforce one.
    pub allowed_cidrs: Field<Vec<String>>,
}
