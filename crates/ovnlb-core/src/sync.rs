// ── Backend sync engine ──
//
// Converges backend state to the upstream source of truth, one load
// balancer at a time. A load balancer missing from the backend goes
// through the full creation cascade and is synced again once the batch
// is done. Failures abort only the load balancer they happen in.

use std::collections::HashSet;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::{
    Backend, LbRecord, find_in_records, find_lb_by_pool_id_with_retry, retry_on_not_found,
};
use crate::driver::Driver;
use crate::dvr;
use crate::encoding::MemberInfo;
use crate::error::CoreError;
use crate::model::{Field, LoadBalancer, Pool};
use crate::network::NetworkLayer;
use crate::request::{Operation, normalize};
use crate::upstream::Upstream;

/// Result of one load balancer pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Backend rows existed and were reconciled.
    Synced,
    /// Backend rows were missing and the creation cascade ran instead.
    Recreated,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub lb_id: String,
    pub error: String,
}

/// Summary of a whole sync run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub synced: Vec<String>,
    pub recreated: Vec<String>,
    pub failed: Vec<SyncFailure>,
}

impl SyncReport {
    fn fail(&mut self, lb_id: &str, error: &CoreError) {
        warn!(lb_id, error = %error, "load balancer sync failed");
        self.failed.push(SyncFailure {
            lb_id: lb_id.to_owned(),
            error: error.to_string(),
        });
    }
}

impl<B, N, U> Driver<B, N, U>
where
    B: Backend,
    N: NetworkLayer,
    U: Upstream,
{
    /// Sync every load balancer the upstream lists for `filters`.
    ///
    /// Only a closed applier aborts the run.
    pub async fn sync(&self, filters: &[(String, String)]) -> Result<SyncReport, CoreError> {
        info!(?filters, "starting backend sync");
        let lb_ids = self.upstream.list_load_balancer_ids(filters).await?;
        let mut report = SyncReport::default();
        let mut recreated = Vec::new();

        for lb_id in lb_ids {
            let lb = match self.upstream.load_balancer(&lb_id).await {
                Ok(lb) => lb,
                Err(e) => {
                    report.fail(&lb_id, &e);
                    continue;
                }
            };

            info!(lb_id = %lb.id, "syncing load balancer");
            let outcome = match self.sync_load_balancer(&lb).await {
                Ok(outcome) => outcome,
                Err(CoreError::ApplierClosed) => return Err(CoreError::ApplierClosed),
                Err(e) => {
                    report.fail(&lb.id, &e);
                    continue;
                }
            };

            self.sync_vip_fip(&lb).await?;

            match outcome {
                SyncOutcome::Synced => report.synced.push(lb.id.clone()),
                SyncOutcome::Recreated => {
                    report.recreated.push(lb.id.clone());
                    recreated.push(lb);
                }
            }
        }

        for lb in &recreated {
            debug!(lb_id = %lb.id, "re-syncing recreated load balancer");
            match self.sync_load_balancer(lb).await {
                Ok(_) => {}
                Err(CoreError::ApplierClosed) => return Err(CoreError::ApplierClosed),
                Err(e) => report.fail(&lb.id, &e),
            }
        }

        info!(
            synced = report.synced.len(),
            recreated = report.recreated.len(),
            failed = report.failed.len(),
            "backend sync finished"
        );
        Ok(report)
    }

    /// Reconcile one load balancer with its backend rows.
    pub async fn sync_load_balancer(&self, lb: &LoadBalancer) -> Result<SyncOutcome, CoreError> {
        let attempts = self.config.effective_attempts();
        let records = match retry_on_not_found(attempts, || {
            self.backend.find_load_balancers(&lb.id)
        })
        .await
        {
            Ok(records) => records,
            Err(e) if e.is_row_not_found() => {
                debug!(lb_id = %lb.id, "load balancer not in backend, starting create");
                self.loadbalancer_create(lb).await?;
                return Ok(SyncOutcome::Recreated);
            }
            Err(e) => return Err(e.into()),
        };

        self.submit_one(normalize::load_balancer(lb, Operation::LbSync))?;
        for listener in lb.listeners.items() {
            self.listener_create_or_sync(listener, Operation::ListenerSync)?;
        }
        for pool in lb.pools.items() {
            self.sync_pool(lb, pool, &records).await?;
        }
        self.submit_one(normalize::health_monitor_purge(&lb.id))?;
        Ok(SyncOutcome::Synced)
    }

    async fn sync_pool(
        &self,
        lb: &LoadBalancer,
        pool: &Pool,
        records: &[LbRecord],
    ) -> Result<(), CoreError> {
        let found = find_in_records(records, &pool.id);
        if found.is_some() {
            self.pool_create_or_sync(pool, Operation::PoolSync)?;
        } else {
            info!(pool_id = %pool.id, "creating pool missing from backend");
            self.pool_create_or_sync(pool, Operation::PoolCreate)?;
        }

        let mut member_ids = HashSet::new();
        for member in pool.members.items() {
            let mut member = member.clone();
            if member.subnet_id.non_empty().is_none() {
                if let Some(subnet) = lb.vip_subnet_id.non_empty() {
                    member.subnet_id = Field::Value(subnet.to_owned());
                }
            }
            debug!(member_id = %member.id, pool_id = %pool.id, "syncing member");
            self.member_sync(&member).await?;
            member_ids.insert(member.id);
        }

        let recorded = match found {
            Some((key, record)) => record.members(&key),
            None => self.recorded_members(&pool.id).await?,
        };
        for orphan in recorded.iter().filter(|m| !member_ids.contains(&m.id)) {
            info!(member_id = %orphan.id, pool_id = %pool.id, "deleting member missing upstream");
            self.submit(vec![
                dvr::recorded_member_delete(orphan, &pool.id),
                dvr::recorded_member_deleted(orphan, &pool.id),
            ])?;
        }

        if let Some(hm) = pool.healthmonitor.as_option() {
            let op = if self.backend.has_health_monitor(&hm.id).await? {
                Operation::HmSync
            } else {
                Operation::HmCreate
            };
            self.health_monitor_create_or_sync(hm, op).await?;
        }
        Ok(())
    }

    /// Members recorded for a pool outside the load balancer's own rows.
    /// A pool that never shows up has none.
    async fn recorded_members(&self, pool_id: &str) -> Result<Vec<MemberInfo>, CoreError> {
        let attempts = self.config.effective_attempts();
        match find_lb_by_pool_id_with_retry(self.backend.as_ref(), pool_id, attempts).await {
            Ok((key, record)) => Ok(record.members(&key)),
            Err(e) if e.is_row_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}
