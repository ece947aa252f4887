// ── In-memory backend store ──
//
// Lock-free `Backend` implementation over DashMaps, loaded from a JSON
// snapshot of the control-plane database. Serves the sync utility and
// the test suites.

mod snapshot;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use dashmap::DashMap;

use crate::backend::{Backend, BackendError, HM_EXT_IDS_KEY, LbRecord, LogicalPort};

pub use snapshot::{BackendSnapshot, HealthCheckRow};

/// Concurrent view of backend load balancers, logical ports and
/// health-check rows.
pub struct BackendStore {
    /// Load balancer rows keyed by row uuid.
    pub(crate) load_balancers: DashMap<String, Arc<LbRecord>>,
    /// Logical ports keyed by port name.
    pub(crate) logical_ports: DashMap<String, Arc<LogicalPort>>,
    /// Health-check rows keyed by row uuid.
    pub(crate) health_checks: DashMap<String, Arc<HealthCheckRow>>,
    health_check_supported: AtomicBool,
}

impl Default for BackendStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BackendStore {
    pub fn new() -> Self {
        Self {
            load_balancers: DashMap::new(),
            logical_ports: DashMap::new(),
            health_checks: DashMap::new(),
            health_check_supported: AtomicBool::new(true),
        }
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Insert or replace a load balancer row. Returns `true` if new.
    pub fn upsert_load_balancer(&self, record: LbRecord) -> bool {
        self.load_balancers
            .insert(record.uuid.clone(), Arc::new(record))
            .is_none()
    }

    pub fn upsert_logical_port(&self, port: LogicalPort) -> bool {
        self.logical_ports
            .insert(port.name.clone(), Arc::new(port))
            .is_none()
    }

    pub fn upsert_health_check(&self, row: HealthCheckRow) -> bool {
        self.health_checks
            .insert(row.uuid.clone(), Arc::new(row))
            .is_none()
    }

    pub fn set_health_check_supported(&self, supported: bool) {
        self.health_check_supported
            .store(supported, Ordering::Relaxed);
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn load_balancer_count(&self) -> usize {
        self.load_balancers.len()
    }

    /// Rows matching `pred`, ordered by uuid for stable output.
    fn rows_where(&self, pred: impl Fn(&LbRecord) -> bool) -> Vec<LbRecord> {
        let mut rows: Vec<LbRecord> = self
            .load_balancers
            .iter()
            .filter(|r| pred(r.value()))
            .map(|r| LbRecord::clone(r.value()))
            .collect();
        rows.sort_by(|a, b| a.uuid.cmp(&b.uuid));
        rows
    }
}

impl Backend for BackendStore {
    async fn find_load_balancers(&self, lb_id: &str) -> Result<Vec<LbRecord>, BackendError> {
        let rows = self.rows_where(|r| r.name == lb_id);
        if rows.is_empty() {
            return Err(BackendError::lb_not_found(lb_id));
        }
        Ok(rows)
    }

    async fn find_by_pool_key(&self, pool_key: &str) -> Result<Option<LbRecord>, BackendError> {
        Ok(self
            .rows_where(|r| r.external_ids.contains_key(pool_key))
            .into_iter()
            .next())
    }

    async fn has_health_monitor(&self, hm_id: &str) -> Result<bool, BackendError> {
        Ok(self.health_checks.iter().any(|row| {
            row.external_ids
                .get(HM_EXT_IDS_KEY)
                .is_some_and(|id| id == hm_id)
        }))
    }

    async fn logical_port(&self, port_id: &str) -> Result<Option<LogicalPort>, BackendError> {
        Ok(self
            .logical_ports
            .get(port_id)
            .map(|r| LogicalPort::clone(r.value())))
    }

    async fn supports_health_checks(&self) -> Result<bool, BackendError> {
        Ok(self.health_check_supported.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::backend::find_lb_by_pool_id;

    fn lb(uuid: &str, name: &str, pairs: &[(&str, &str)]) -> LbRecord {
        LbRecord {
            uuid: uuid.into(),
            name: name.into(),
            protocol: Some("tcp".into()),
            external_ids: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[tokio::test]
    async fn load_balancer_rows_are_grouped_by_name() {
        let store = BackendStore::new();
        store.upsert_load_balancer(lb("b", "lb1", &[]));
        store.upsert_load_balancer(lb("a", "lb1", &[]));
        store.upsert_load_balancer(lb("c", "lb2", &[]));

        let rows = store.find_load_balancers("lb1").await.unwrap();
        let uuids: Vec<&str> = rows.iter().map(|r| r.uuid.as_str()).collect();
        assert_eq!(uuids, vec!["a", "b"]);

        let err = store.find_load_balancers("lb3").await.unwrap_err();
        assert!(err.is_row_not_found());
    }

    #[tokio::test]
    async fn disabled_pool_is_found_by_second_lookup() {
        let store = BackendStore::new();
        store.upsert_load_balancer(lb("a", "lb1", &[("pool_p1:D", "")]));

        assert!(store.find_by_pool_key("pool_p1").await.unwrap().is_none());
        let (key, record) = find_lb_by_pool_id(&store, "p1").await.unwrap().unwrap();
        assert_eq!(key, "pool_p1:D");
        assert_eq!(record.name, "lb1");
    }

    #[tokio::test]
    async fn health_monitor_rows_match_on_metadata() {
        let store = BackendStore::new();
        store.upsert_health_check(HealthCheckRow {
            uuid: "hc1".into(),
            external_ids: BTreeMap::from([(HM_EXT_IDS_KEY.to_owned(), "hm1".to_owned())]),
        });

        assert!(store.has_health_monitor("hm1").await.unwrap());
        assert!(!store.has_health_monitor("hm2").await.unwrap());
    }

    #[tokio::test]
    async fn health_check_capability_toggles() {
        let store = BackendStore::new();
        assert!(store.supports_health_checks().await.unwrap());
        store.set_health_check_supported(false);
        assert!(!store.supports_health_checks().await.unwrap());
    }
}
