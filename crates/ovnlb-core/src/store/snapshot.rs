// ── Backend snapshot loading ──
//
// A JSON dump of the backend tables the driver reads. Applying a
// snapshot upserts every row and prunes rows that vanished, so a store
// can be refreshed in place without an empty intermediate state.

use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use std::path::Path;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use super::BackendStore;
use crate::backend::{LbRecord, LogicalPort};
use crate::error::CoreError;

/// One backend health-check row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckRow {
    pub uuid: String,
    #[serde(default)]
    pub external_ids: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSnapshot {
    #[serde(default)]
    pub load_balancers: Vec<LbRecord>,
    #[serde(default)]
    pub logical_ports: Vec<LogicalPort>,
    #[serde(default)]
    pub health_checks: Vec<HealthCheckRow>,
    /// `false` for schemas that predate load balancer health checks.
    #[serde(default = "default_true")]
    pub health_check_supported: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BackendSnapshot {
    fn default() -> Self {
        Self {
            load_balancers: Vec::new(),
            logical_ports: Vec::new(),
            health_checks: Vec::new(),
            health_check_supported: true,
        }
    }
}

impl BackendSnapshot {
    /// Read a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| CoreError::Snapshot {
            message: format!("{}: {e}", path.display()),
        })?;
        Self::from_json(&raw).map_err(|e| CoreError::Snapshot {
            message: format!("{}: {e}", path.display()),
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Upsert every incoming row, then drop keys absent from the batch.
fn upsert_and_prune<K, V>(map: &DashMap<K, Arc<V>>, items: Vec<(K, V)>)
where
    K: Eq + Hash + Clone,
{
    let incoming: HashSet<K> = items.iter().map(|(k, _)| k.clone()).collect();
    for (key, value) in items {
        map.insert(key, Arc::new(value));
    }
    map.retain(|key, _| incoming.contains(key));
}

impl BackendStore {
    pub fn from_snapshot(snapshot: BackendSnapshot) -> Self {
        let store = Self::new();
        store.apply_snapshot(snapshot);
        store
    }

    /// Replace the store contents with `snapshot`.
    pub fn apply_snapshot(&self, snapshot: BackendSnapshot) {
        upsert_and_prune(
            &self.load_balancers,
            snapshot
                .load_balancers
                .into_iter()
                .map(|r| (r.uuid.clone(), r))
                .collect(),
        );
        upsert_and_prune(
            &self.logical_ports,
            snapshot
                .logical_ports
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        );
        upsert_and_prune(
            &self.health_checks,
            snapshot
                .health_checks
                .into_iter()
                .map(|h| (h.uuid.clone(), h))
                .collect(),
        );
        self.set_health_check_supported(snapshot.health_check_supported);

        tracing::debug!(
            load_balancers = self.load_balancers.len(),
            logical_ports = self.logical_ports.len(),
            health_checks = self.health_checks.len(),
            "backend snapshot applied"
        );
    }
}
