// ── Load-balancing domain model ──
//
// Per-call snapshots of the objects received from the load-balancing
// API. Every optional attribute is a three-state `Field` so create and
// update paths can tell "not provided" from "cleared".

pub mod common;
pub mod field;

pub mod health_monitor;
pub mod listener;
pub mod load_balancer;
pub mod member;
pub mod pool;

// ── Re-exports ──────────────────────────────────────────────────────

pub use common::{Algorithm, HealthMonitorType, Protocol, SessionPersistence, SessionPersistenceType};
pub use field::Field;
pub use health_monitor::HealthMonitor;
pub use listener::Listener;
pub use load_balancer::{AdditionalVip, LoadBalancer};
pub use member::Member;
pub use pool::Pool;
