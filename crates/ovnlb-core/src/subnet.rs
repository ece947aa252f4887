// ── Member subnet resolution ──
//
// The API allows members without a subnet. The backend needs one, so it
// is inferred from the pool's load balancer VIP subnet and accepted only
// when the member address falls inside that subnet.

use std::net::IpAddr;

use strum::Display;
use tracing::debug;

use crate::backend::{Backend, LbRecord, find_lb_by_pool_id};
use crate::error::CoreError;
use crate::model::{LoadBalancer, Member};
use crate::network::NetworkLayer;

/// Operation named in the "Subnet is required" message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MemberAction {
    #[strum(serialize = "creation")]
    Creation,
    #[strum(serialize = "deletion")]
    Deletion,
    #[strum(serialize = "batch update")]
    BatchUpdate,
}

pub(crate) fn subnet_required(action: MemberAction) -> CoreError {
    CoreError::unsupported(format!(
        "Subnet is required, or Loadbalancer associated with Pool must have a subnet, \
         for Member {action} with OVN Provider Driver if it is not the same as LB VIP subnet"
    ))
}

/// Whether `address` lies inside `cidr`. Bracketed IPv6 literals are
/// accepted; a bare address counts as a host route.
pub fn address_in_cidr(address: &str, cidr: &str) -> bool {
    let bare = address.trim().trim_start_matches('[').trim_end_matches(']');
    let Ok(ip) = bare.parse::<IpAddr>() else {
        return false;
    };
    let (net, prefix) = match cidr.trim().split_once('/') {
        Some((net, prefix)) => match prefix.parse::<u32>() {
            Ok(prefix) => (net, Some(prefix)),
            Err(_) => return false,
        },
        None => (cidr.trim(), None),
    };
    let Ok(net) = net.parse::<IpAddr>() else {
        return false;
    };

    match (ip, net) {
        (IpAddr::V4(ip), IpAddr::V4(net)) => {
            let Some(mask) = prefix_mask(prefix.unwrap_or(32), 32) else {
                return false;
            };
            (u128::from(u32::from(ip)) & mask) == (u128::from(u32::from(net)) & mask)
        }
        (IpAddr::V6(ip), IpAddr::V6(net)) => {
            let Some(mask) = prefix_mask(prefix.unwrap_or(128), 128) else {
                return false;
            };
            (u128::from(ip) & mask) == (u128::from(net) & mask)
        }
        _ => false,
    }
}

/// Network mask of `prefix` leading ones in a `width`-bit address.
fn prefix_mask(prefix: u32, width: u32) -> Option<u128> {
    if prefix > width {
        return None;
    }
    let all = if width == 128 { u128::MAX } else { (1u128 << width) - 1 };
    Some(all & !all.checked_shr(prefix).unwrap_or(0))
}

/// VIP subnet id and CIDR of a backend record. A subnet the network layer
/// no longer knows reads as absent.
pub(crate) async fn subnet_of_record<N: NetworkLayer>(
    network: &N,
    record: &LbRecord,
) -> Result<Option<(String, String)>, CoreError> {
    let Some(subnet_id) = record.vip_subnet_id() else {
        return Ok(None);
    };
    match network.subnet(subnet_id).await {
        Ok(subnet) => Ok(Some((subnet.id, subnet.cidr))),
        Err(e) if e.is_not_found() => {
            debug!(subnet_id, "VIP subnet not found in network layer");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// VIP subnet of the load balancer holding `pool_id`.
pub async fn subnet_from_pool<B: Backend, N: NetworkLayer>(
    backend: &B,
    network: &N,
    pool_id: &str,
) -> Result<Option<(String, String)>, CoreError> {
    match find_lb_by_pool_id(backend, pool_id).await? {
        Some((_, record)) => subnet_of_record(network, &record).await,
        None => Ok(None),
    }
}

/// The member's subnet: the explicit one, or the pool's VIP subnet when
/// it contains the member address.
pub async fn resolve_subnet<B: Backend, N: NetworkLayer>(
    backend: &B,
    network: &N,
    member: &Member,
    action: MemberAction,
) -> Result<String, CoreError> {
    if let Some(subnet) = member.subnet_id.non_empty() {
        return Ok(subnet.to_owned());
    }
    let address = member.address.non_empty().unwrap_or_default();
    match subnet_from_pool(backend, network, &member.pool_id).await? {
        Some((id, cidr)) if address_in_cidr(address, &cidr) => Ok(id),
        _ => Err(subnet_required(action)),
    }
}

/// Subnet for a member created as part of a load balancer cascade, before
/// the backend holds any record of its pool.
///
/// Falls back to the VIP subnet, then to the VIP network subnet that
/// contains the member address.
pub async fn cascade_subnet<N: NetworkLayer>(
    network: &N,
    lb: &LoadBalancer,
    member: &Member,
) -> Result<Option<String>, CoreError> {
    if let Some(subnet) = member.subnet_id.non_empty() {
        return Ok(Some(subnet.to_owned()));
    }
    if let Some(subnet) = lb.vip_subnet_id.non_empty() {
        return Ok(Some(subnet.to_owned()));
    }
    let (Some(network_id), Some(address)) = (lb.vip_network_id.non_empty(), member.address.non_empty())
    else {
        return Ok(None);
    };
    let subnets = network.network_subnets(network_id).await?;
    Ok(subnets
        .into_iter()
        .find(|s| address_in_cidr(address, &s.cidr))
        .map(|s| s.id))
}
