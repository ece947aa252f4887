// ── Backend records and lookups ──
//
// Read-only view of the control-plane database. A load balancer is one
// named row per protocol carrying a string metadata map; listeners,
// pools and members live inside that map. Writes only ever happen
// through the change-request applier.

mod retry;

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::encoding::{MemberInfo, decode_pool_members};

pub use retry::retry_on_not_found;

// ── Metadata keys ───────────────────────────────────────────────────

pub const LB_EXT_IDS_VIP_KEY: &str = "neutron:vip";
pub const LB_EXT_IDS_ADDIT_VIP_KEY: &str = "neutron:additional_vips";
pub const LB_EXT_IDS_VIP_PORT_ID_KEY: &str = "neutron:vip_port_id";
pub const LB_EXT_IDS_VIP_SUBNET_ID_KEY: &str = "neutron:vip_subnet_id";
pub const LB_EXT_IDS_VIP_FIP_KEY: &str = "neutron:vip_fip";
pub const PORT_EXT_IDS_FIP_KEY: &str = "neutron:port_fip";
pub const HM_EXT_IDS_KEY: &str = "octavia:healthmonitor";

/// Suffix marking an administratively disabled pool or listener key.
pub const DISABLED_SUFFIX: &str = ":D";

/// Metadata key of an enabled pool.
pub fn pool_key(pool_id: &str) -> String {
    format!("pool_{pool_id}")
}

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Row not visible yet; may appear once an in-flight transaction lands.
    #[error("{table} row '{id}' not found")]
    RowNotFound { table: &'static str, id: String },

    #[error("backend unavailable: {message}")]
    Unavailable { message: String },
}

impl BackendError {
    pub fn is_row_not_found(&self) -> bool {
        matches!(self, Self::RowNotFound { .. })
    }

    pub(crate) fn lb_not_found(id: impl Into<String>) -> Self {
        Self::RowNotFound {
            table: "Load_Balancer",
            id: id.into(),
        }
    }
}

// ── Records ─────────────────────────────────────────────────────────

/// One backend load balancer row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LbRecord {
    pub uuid: String,
    /// The load balancer id from the upstream API.
    pub name: String,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub external_ids: BTreeMap<String, String>,
}

impl LbRecord {
    fn ext(&self, key: &str) -> Option<&str> {
        self.external_ids
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn vip(&self) -> Option<&str> {
        self.ext(LB_EXT_IDS_VIP_KEY)
    }

    /// Primary VIP followed by any additional VIPs, empty entries dropped.
    pub fn vips(&self) -> Vec<&str> {
        let additional = self
            .ext(LB_EXT_IDS_ADDIT_VIP_KEY)
            .into_iter()
            .flat_map(|v| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty());
        self.vip().into_iter().chain(additional).collect()
    }

    pub fn vip_port_id(&self) -> Option<&str> {
        self.ext(LB_EXT_IDS_VIP_PORT_ID_KEY)
    }

    pub fn vip_subnet_id(&self) -> Option<&str> {
        self.ext(LB_EXT_IDS_VIP_SUBNET_ID_KEY)
    }

    pub fn vip_fip(&self) -> Option<&str> {
        self.ext(LB_EXT_IDS_VIP_FIP_KEY)
    }

    /// The metadata key under which `pool_id` is stored, enabled or not.
    pub fn pool_key_for(&self, pool_id: &str) -> Option<String> {
        let key = pool_key(pool_id);
        if self.external_ids.contains_key(&key) {
            return Some(key);
        }
        let disabled = format!("{key}{DISABLED_SUFFIX}");
        self.external_ids.contains_key(&disabled).then_some(disabled)
    }

    /// Members currently recorded under `pool_key`.
    pub fn members(&self, pool_key: &str) -> Vec<MemberInfo> {
        self.external_ids
            .get(pool_key)
            .map(|v| decode_pool_members(v))
            .unwrap_or_default()
    }
}

/// A backend logical switch port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalPort {
    /// Named after the network port id.
    pub name: String,
    #[serde(default)]
    pub external_ids: BTreeMap<String, String>,
}

impl LogicalPort {
    /// Floating IP recorded on the port, if any.
    pub fn fip(&self) -> Option<&str> {
        self.external_ids
            .get(PORT_EXT_IDS_FIP_KEY)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

// ── Backend trait ───────────────────────────────────────────────────

/// Read-side lookups against the control-plane database.
pub trait Backend: Send + Sync {
    /// All rows named `lb_id`. `RowNotFound` when there are none.
    fn find_load_balancers(
        &self,
        lb_id: &str,
    ) -> impl Future<Output = Result<Vec<LbRecord>, BackendError>> + Send;

    /// The row whose metadata contains exactly `pool_key`.
    fn find_by_pool_key(
        &self,
        pool_key: &str,
    ) -> impl Future<Output = Result<Option<LbRecord>, BackendError>> + Send;

    /// Whether any health-check row belongs to `hm_id`.
    fn has_health_monitor(
        &self,
        hm_id: &str,
    ) -> impl Future<Output = Result<bool, BackendError>> + Send;

    fn logical_port(
        &self,
        port_id: &str,
    ) -> impl Future<Output = Result<Option<LogicalPort>, BackendError>> + Send;

    /// Whether the schema has load balancer health checks at all.
    fn supports_health_checks(&self) -> impl Future<Output = Result<bool, BackendError>> + Send;
}

// ── Pool lookups ────────────────────────────────────────────────────

/// Find the row holding `pool_id`: the enabled key first, then the
/// disabled variant.
pub async fn find_lb_by_pool_id<B: Backend>(
    backend: &B,
    pool_id: &str,
) -> Result<Option<(String, LbRecord)>, BackendError> {
    let key = pool_key(pool_id);
    if let Some(record) = backend.find_by_pool_key(&key).await? {
        return Ok(Some((key, record)));
    }
    let disabled = format!("{key}{DISABLED_SUFFIX}");
    Ok(backend
        .find_by_pool_key(&disabled)
        .await?
        .map(|record| (disabled, record)))
}

/// Same two-step lookup restricted to already-fetched rows.
pub fn find_in_records<'a>(
    records: &'a [LbRecord],
    pool_id: &str,
) -> Option<(String, &'a LbRecord)> {
    records
        .iter()
        .find_map(|record| record.pool_key_for(pool_id).map(|key| (key, record)))
}

/// Two-step pool lookup that retries while the row is not yet visible.
pub async fn find_lb_by_pool_id_with_retry<B: Backend>(
    backend: &B,
    pool_id: &str,
    attempts: u32,
) -> Result<(String, LbRecord), BackendError> {
    retry_on_not_found(attempts, || async {
        find_lb_by_pool_id(backend, pool_id)
            .await?
            .ok_or_else(|| BackendError::lb_not_found(pool_key(pool_id)))
    })
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn record(pairs: &[(&str, &str)]) -> LbRecord {
        LbRecord {
            uuid: "row1".into(),
            name: "lb1".into(),
            protocol: Some("tcp".into()),
            external_ids: pairs
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
        }
    }

    #[test]
    fn vips_include_additional_addresses() {
        let rec = record(&[
            (LB_EXT_IDS_VIP_KEY, "10.0.0.5"),
            (LB_EXT_IDS_ADDIT_VIP_KEY, "fd00::5, ,10.1.0.5"),
        ]);
        assert_eq!(rec.vips(), vec!["10.0.0.5", "fd00::5", "10.1.0.5"]);
    }

    #[test]
    fn pool_key_prefers_enabled_then_disabled() {
        let enabled = record(&[("pool_p1", "")]);
        assert_eq!(enabled.pool_key_for("p1").as_deref(), Some("pool_p1"));

        let disabled = record(&[("pool_p1:D", "")]);
        assert_eq!(disabled.pool_key_for("p1").as_deref(), Some("pool_p1:D"));

        assert_eq!(disabled.pool_key_for("p2"), None);
    }

    #[test]
    fn members_decode_from_pool_value() {
        let rec = record(&[(
            "pool_p1",
            "member_m1_10.0.0.10:80_sub1,member_m2_10.0.0.11:80",
        )]);
        let members = rec.members("pool_p1");
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].subnet_id, None);
        assert!(rec.members("pool_missing").is_empty());
    }

    #[test]
    fn find_in_records_uses_disabled_variant() {
        let records = vec![record(&[("pool_other", "")]), record(&[("pool_p1:D", "")])];
        let (key, _) = find_in_records(&records, "p1").unwrap();
        assert_eq!(key, "pool_p1:D");
    }

    #[test]
    fn port_fip_ignores_empty_value() {
        let mut port = LogicalPort {
            name: "vip-port".into(),
            ..LogicalPort::default()
        };
        assert_eq!(port.fip(), None);
        port.external_ids
            .insert(PORT_EXT_IDS_FIP_KEY.into(), String::new());
        assert_eq!(port.fip(), None);
        port.external_ids
            .insert(PORT_EXT_IDS_FIP_KEY.into(), "172.24.4.10".into());
        assert_eq!(port.fip(), Some("172.24.4.10"));
    }
}
