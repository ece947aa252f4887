//! Validation, request translation and sync engine between a cloud
//! load-balancing API and an OVN-style control-plane database.
//!
//! This crate owns the provider driver logic for the `ovnlb` workspace:
//!
//! - **[`Driver`]**: Façade with one entry point per entity and lifecycle
//!   event. Validates each call against backend capabilities, then emits
//!   [`ChangeRequest`]s to an `mpsc` applier queue. [`Driver::sync()`]
//!   reconciles backend state with the upstream source of truth.
//!
//! - **[`Backend`]**: Read-side seam over the control-plane database:
//!   load balancer rows, logical ports and health checks. [`BackendStore`]
//!   is the lock-free in-memory implementation (`DashMap`) loaded from a
//!   JSON snapshot.
//!
//! - **[`NetworkLayer`] / [`Upstream`]**: Seams over the network API (port
//!   allocation, floating IPs, subnets) and the load-balancing API (object
//!   graphs), implemented for the `ovnlb-api` HTTP clients.
//!
//! - **Domain model** ([`model`]): Per-call snapshots of load balancers,
//!   listeners, pools, members and health monitors, with three-state
//!   [`Field`] attributes separating "unset" from "cleared".

pub mod backend;
pub mod config;
pub mod convert;
pub mod driver;
pub mod dvr;
pub mod encoding;
pub mod error;
pub mod fip;
pub mod model;
pub mod network;
pub mod request;
pub mod store;
pub mod subnet;
pub mod sync;
pub mod upstream;
pub mod validate;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{Backend, BackendError, LbRecord, LogicalPort};
pub use config::{DEFAULT_LOOKUP_ATTEMPTS, DriverConfig};
pub use driver::{Driver, VipPort, VipRequest};
pub use encoding::MemberInfo;
pub use error::CoreError;
pub use fip::{FipDecision, FipDrift};
pub use network::{AllocatedPort, NetworkLayer, PortRequest};
pub use request::{ChangeRequest, DvrAction, Operation};
pub use store::{BackendSnapshot, BackendStore, HealthCheckRow};
pub use sync::{SyncFailure, SyncOutcome, SyncReport};
pub use upstream::Upstream;

pub use model::{
    AdditionalVip, Algorithm, Field, HealthMonitor, HealthMonitorType, Listener, LoadBalancer,
    Member, Pool, Protocol, SessionPersistence, SessionPersistenceType,
};
