// ── VIP floating-IP consistency ──
//
// Compares the floating IP the network layer binds to a VIP port with
// the one recorded on the backend logical port. Only agreement leads to
// a change request; any disagreement is logged as drift and left for the
// network database sync to repair.

use tracing::{debug, info, warn};

use crate::backend::{Backend, LbRecord};
use crate::driver::Driver;
use crate::error::CoreError;
use crate::model::LoadBalancer;
use crate::network::NetworkLayer;
use crate::request::normalize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FipDrift {
    /// The network layer has a floating IP the logical port does not record.
    MissingOnPort { external: String },
    /// Both sides have a floating IP, and they differ.
    Mismatch { external: String, recorded: String },
    /// The logical port records a floating IP the network layer does not have.
    MissingExternally { recorded: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FipDecision {
    InSync,
    /// Both sides agree, but the load balancer rows do not carry it yet.
    Apply { fip: String },
    Drift(FipDrift),
}

/// Decide what to do about a VIP floating IP.
///
/// `lb_fips` holds the floating IP recorded on each backend row of the
/// load balancer. No rows at all means the rows are still being created,
/// which also calls for an apply.
pub fn decide(external: Option<&str>, recorded: Option<&str>, lb_fips: &[Option<&str>]) -> FipDecision {
    match (external, recorded) {
        (None, None) => FipDecision::InSync,
        (Some(external), None) => FipDecision::Drift(FipDrift::MissingOnPort {
            external: external.to_owned(),
        }),
        (None, Some(recorded)) => FipDecision::Drift(FipDrift::MissingExternally {
            recorded: recorded.to_owned(),
        }),
        (Some(external), Some(recorded)) if external != recorded => {
            FipDecision::Drift(FipDrift::Mismatch {
                external: external.to_owned(),
                recorded: recorded.to_owned(),
            })
        }
        (Some(fip), Some(_)) => {
            if !lb_fips.is_empty() && lb_fips.iter().all(|recorded| *recorded == Some(fip)) {
                FipDecision::InSync
            } else {
                FipDecision::Apply { fip: fip.to_owned() }
            }
        }
    }
}

impl<B, N, U> Driver<B, N, U>
where
    B: Backend,
    N: NetworkLayer,
{
    /// Reconcile the VIP floating IP of `lb`.
    ///
    /// Returns `true` when the two sides agree, `false` when the step was
    /// skipped or drift was found. Only a closed applier is an error.
    pub async fn sync_vip_fip(&self, lb: &LoadBalancer) -> Result<bool, CoreError> {
        let lb_id = lb.id.as_str();
        info!(lb_id, "starting floating IP sync");
        if lb.vip_network_id.non_empty().is_none() {
            debug!(lb_id, "VIP network not set, skipping floating IP sync");
            return Ok(false);
        }

        let rows: Vec<LbRecord> = match self.backend.find_load_balancers(lb_id).await {
            Ok(rows) => rows,
            Err(e) if e.is_row_not_found() => Vec::new(),
            Err(e) => {
                warn!(lb_id, error = %e, "failed to read load balancer rows, skipping floating IP sync");
                return Ok(false);
            }
        };
        // The backend row remembers the VIP port when the upstream snapshot lost it.
        let Some(port_id) = lb
            .vip_port_id
            .non_empty()
            .or_else(|| rows.iter().find_map(LbRecord::vip_port_id))
        else {
            debug!(lb_id, "VIP port not set, skipping floating IP sync");
            return Ok(false);
        };

        let external = match self.network.floating_ips(port_id).await {
            Ok(fips) => fips.into_iter().next(),
            Err(e) => {
                warn!(lb_id, error = %e, "failed to fetch floating IPs, skipping floating IP sync");
                return Ok(false);
            }
        };

        let port = match self.backend.logical_port(port_id).await {
            Ok(port) => port,
            Err(e) => {
                warn!(lb_id, error = %e, "failed to read VIP logical port, skipping floating IP sync");
                return Ok(false);
            }
        };
        let recorded = port.as_ref().and_then(|p| p.fip());
        let lb_fips: Vec<Option<&str>> = rows.iter().map(LbRecord::vip_fip).collect();

        match decide(external.as_deref(), recorded, &lb_fips) {
            FipDecision::InSync => Ok(true),
            FipDecision::Apply { fip } => {
                let port_name = port.as_ref().map_or(port_id, |p| p.name.as_str());
                self.submit_one(normalize::vip_fip_sync(lb_id, port_id, port_name, &fip))?;
                Ok(true)
            }
            FipDecision::Drift(drift) => {
                match drift {
                    FipDrift::MissingOnPort { external } => warn!(
                        lb_id,
                        port_id,
                        external = %external,
                        "logical switch port has no floating IP; run the network database sync first"
                    ),
                    FipDrift::Mismatch { external, recorded } => warn!(
                        lb_id,
                        port_id,
                        external = %external,
                        recorded = %recorded,
                        "floating IP differs between logical switch port and network layer; \
                         run the network database sync first"
                    ),
                    FipDrift::MissingExternally { recorded } => warn!(
                        lb_id,
                        port_id,
                        recorded = %recorded,
                        "logical switch port has a floating IP unknown to the network layer; \
                         run the network database sync first"
                    ),
                }
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_on_either_side() {
        assert_eq!(decide(None, None, &[]), FipDecision::InSync);
    }

    #[test]
    fn one_sided_values_are_drift() {
        assert!(matches!(
            decide(Some("172.24.4.9"), None, &[]),
            FipDecision::Drift(FipDrift::MissingOnPort { .. })
        ));
        assert!(matches!(
            decide(None, Some("172.24.4.9"), &[]),
            FipDecision::Drift(FipDrift::MissingExternally { .. })
        ));
    }

    #[test]
    fn disagreement_is_drift() {
        assert_eq!(
            decide(Some("172.24.4.9"), Some("172.24.4.10"), &[None]),
            FipDecision::Drift(FipDrift::Mismatch {
                external: "172.24.4.9".into(),
                recorded: "172.24.4.10".into(),
            })
        );
    }

    #[test]
    fn agreement_applies_only_when_rows_lag() {
        let fip = "172.24.4.9";
        assert_eq!(
            decide(Some(fip), Some(fip), &[None]),
            FipDecision::Apply { fip: fip.into() }
        );
        assert_eq!(
            decide(Some(fip), Some(fip), &[Some(fip), Some("172.24.4.1")]),
            FipDecision::Apply { fip: fip.into() }
        );
        assert_eq!(decide(Some(fip), Some(fip), &[Some(fip)]), FipDecision::InSync);
        assert_eq!(
            decide(Some(fip), Some(fip), &[]),
            FipDecision::Apply { fip: fip.into() }
        );
    }
}
