// ── Pool domain type ──

use super::common::SessionPersistence;
use super::field::Field;
use super::health_monitor::HealthMonitor;
use super::member::Member;

/// A pool with its members and optional health monitor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pool {
    pub id: String,
    pub loadbalancer_id: Field<String>,
    pub listener_id: Field<String>,
    pub protocol: Field<String>,
    pub lb_algorithm: Field<String>,
    pub session_persistence: Field<SessionPersistence>,
    pub admin_state_up: Field<bool>,
    pub healthmonitor: Field<HealthMonitor>,
    pub members: Field<Vec<Member>>,
}
