// ── Request normalization ──
//
// One builder per entity and operation. Create and sync requests carry
// every attribute with defaults filled in; update requests carry the
// identifying old values plus only what the caller provided.
//
// Builders never validate. The driver validates before calling them.

use serde_json::{Value, json};

use super::{ChangeRequest, DvrAction, Operation};
use crate::model::{Field, HealthMonitor, Listener, LoadBalancer, Member, Pool};

fn enabled(admin_state_up: &Field<bool>) -> Value {
    json!(admin_state_up.or_default_when_unset(true))
}

// ── Load balancer ───────────────────────────────────────────────────

/// `lb_create` or `lb_sync`.
pub fn load_balancer(lb: &LoadBalancer, op: Operation) -> ChangeRequest {
    let request = ChangeRequest::new(
        op,
        json!({
            "id": lb.id,
            "vip_address": lb.vip_address.to_json(),
            "vip_network_id": lb.vip_network_id.to_json(),
            "admin_state_up": enabled(&lb.admin_state_up),
        }),
    );
    if lb.additional_vips.is_set() {
        request.with("additional_vips", lb.additional_vips.to_json())
    } else {
        request
    }
}

pub fn load_balancer_update(new: &LoadBalancer) -> ChangeRequest {
    let request = ChangeRequest::new(Operation::LbUpdate, json!({ "id": new.id }));
    if new.admin_state_up.is_set() {
        request.with("admin_state_up", new.admin_state_up.to_json())
    } else {
        request
    }
}

pub fn load_balancer_delete(lb: &LoadBalancer, cascade: bool) -> ChangeRequest {
    ChangeRequest::new(Operation::LbDelete, json!({ "id": lb.id, "cascade": cascade }))
}

// ── Listener ────────────────────────────────────────────────────────

/// `listener_create` or `listener_sync`.
pub fn listener(listener: &Listener, op: Operation) -> ChangeRequest {
    ChangeRequest::new(
        op,
        json!({
            "id": listener.id,
            "protocol": listener.protocol.to_json(),
            "loadbalancer_id": listener.loadbalancer_id.to_json(),
            "protocol_port": listener.protocol_port.to_json(),
            "default_pool_id": listener.default_pool_id.to_json(),
            "admin_state_up": enabled(&listener.admin_state_up),
        }),
    )
}

pub fn listener_update(old: &Listener, new: &Listener) -> ChangeRequest {
    let mut request = ChangeRequest::new(
        Operation::ListenerUpdate,
        json!({
            "id": new.id,
            "loadbalancer_id": old.loadbalancer_id.to_json(),
            "protocol": old.protocol.to_json(),
            "protocol_port": old.protocol_port.to_json(),
        }),
    );
    if new.admin_state_up.is_set() {
        request = request.with("admin_state_up", new.admin_state_up.to_json());
    }
    if new.default_pool_id.is_set() {
        request = request.with("default_pool_id", new.default_pool_id.to_json());
    }
    request
}

pub fn listener_delete(listener: &Listener) -> ChangeRequest {
    ChangeRequest::new(
        Operation::ListenerDelete,
        json!({
            "id": listener.id,
            "loadbalancer_id": listener.loadbalancer_id.to_json(),
            "protocol_port": listener.protocol_port.to_json(),
            "protocol": listener.protocol.to_json(),
        }),
    )
}

// ── Pool ────────────────────────────────────────────────────────────

/// `pool_create` or `pool_sync`.
pub fn pool(pool: &Pool, op: Operation) -> ChangeRequest {
    let request = ChangeRequest::new(
        op,
        json!({
            "id": pool.id,
            "loadbalancer_id": pool.loadbalancer_id.to_json(),
            "protocol": pool.protocol.to_json(),
            "lb_algorithm": pool.lb_algorithm.to_json(),
            "listener_id": pool.listener_id.to_json(),
            "admin_state_up": enabled(&pool.admin_state_up),
        }),
    );
    if pool.session_persistence.is_set() {
        request.with("session_persistence", pool.session_persistence.to_json())
    } else {
        request
    }
}

pub fn pool_update(old: &Pool, new: &Pool) -> ChangeRequest {
    let mut request = ChangeRequest::new(
        Operation::PoolUpdate,
        json!({
            "id": old.id,
            "protocol": old.protocol.to_json(),
            "loadbalancer_id": old.loadbalancer_id.to_json(),
        }),
    );
    if new.admin_state_up.is_set() {
        request = request.with("admin_state_up", new.admin_state_up.to_json());
    }
    if new.session_persistence.is_set() {
        request = request.with("session_persistence", new.session_persistence.to_json());
    }
    request
}

pub fn pool_delete(pool: &Pool) -> ChangeRequest {
    ChangeRequest::new(
        Operation::PoolDelete,
        json!({
            "id": pool.id,
            "protocol": pool.protocol.to_json(),
            "loadbalancer_id": pool.loadbalancer_id.to_json(),
        }),
    )
}

// ── Member ──────────────────────────────────────────────────────────

/// `member_create`, `member_sync`, or a batch create/update, with the
/// subnet already resolved.
pub fn member(member: &Member, subnet_id: Option<&str>, op: Operation) -> ChangeRequest {
    ChangeRequest::new(
        op,
        json!({
            "id": member.id,
            "address": member.address.to_json(),
            "protocol_port": member.protocol_port.to_json(),
            "pool_id": member.pool_id,
            "subnet_id": subnet_id,
            "admin_state_up": enabled(&member.admin_state_up),
        }),
    )
}

pub fn member_update(old: &Member, new: &Member) -> ChangeRequest {
    let request = ChangeRequest::new(
        Operation::MemberUpdate,
        json!({
            "id": new.id,
            "address": old.address.to_json(),
            "protocol_port": old.protocol_port.to_json(),
            "pool_id": old.pool_id,
            "old_admin_state_up": old.admin_state_up.to_json(),
        }),
    );
    if new.admin_state_up.is_set() {
        request.with("admin_state_up", new.admin_state_up.to_json())
    } else {
        request
    }
}

/// `member_delete`. A `None` subnet omits the key, as for legacy entries.
pub fn member_delete(
    id: &str,
    address: Value,
    protocol_port: Value,
    pool_id: &str,
    subnet_id: Option<&str>,
) -> ChangeRequest {
    let request = ChangeRequest::new(
        Operation::MemberDelete,
        json!({
            "id": id,
            "address": address,
            "protocol_port": protocol_port,
            "pool_id": pool_id,
        }),
    );
    match subnet_id {
        Some(subnet) => request.with("subnet_id", subnet),
        None => request,
    }
}

/// `handle_member_dvr`. A `None` subnet omits the key.
pub fn member_dvr(
    id: &str,
    address: Value,
    pool_id: &str,
    subnet_id: Option<&str>,
    action: DvrAction,
) -> ChangeRequest {
    let mut request = ChangeRequest::new(
        Operation::HandleMemberDvr,
        json!({
            "id": id,
            "address": address,
            "pool_id": pool_id,
        }),
    );
    if let Some(subnet) = subnet_id {
        request = request.with("subnet_id", subnet);
    }
    request.with("action", action.to_string())
}

// ── Health monitor ──────────────────────────────────────────────────

/// `hm_create` or `hm_sync`.
pub fn health_monitor(hm: &HealthMonitor, op: Operation) -> ChangeRequest {
    ChangeRequest::new(
        op,
        json!({
            "id": hm.id,
            "pool_id": hm.pool_id,
            "type": hm.kind.to_json(),
            "interval": hm.delay.to_json(),
            "timeout": hm.timeout.to_json(),
            "failure_count": hm.max_retries_down.to_json(),
            "success_count": hm.max_retries.to_json(),
            "admin_state_up": enabled(&hm.admin_state_up),
        }),
    )
}

pub fn health_monitor_update(old: &HealthMonitor, new: &HealthMonitor) -> ChangeRequest {
    ChangeRequest::new(
        Operation::HmUpdate,
        json!({
            "id": new.id,
            "pool_id": old.pool_id,
            "interval": new.delay.to_json(),
            "timeout": new.timeout.to_json(),
            "failure_count": new.max_retries_down.to_json(),
            "success_count": new.max_retries.to_json(),
            "admin_state_up": enabled(&new.admin_state_up),
        }),
    )
}

pub fn health_monitor_delete(hm: &HealthMonitor) -> ChangeRequest {
    ChangeRequest::new(
        Operation::HmDelete,
        json!({ "id": hm.id, "pool_id": hm.pool_id }),
    )
}

pub fn health_monitor_purge(lb_id: &str) -> ChangeRequest {
    ChangeRequest::new(Operation::HmPurge, json!({ "loadbalancer_id": lb_id }))
}

// ── Floating IP ─────────────────────────────────────────────────────

pub fn vip_fip_sync(lb_id: &str, vip_port_id: &str, port_name: &str, fip: &str) -> ChangeRequest {
    ChangeRequest::new(
        Operation::VipFipSync,
        json!({
            "loadbalancer_id": lb_id,
            "vip_port_id": vip_port_id,
            "port_name": port_name,
            "vip_fip": fip,
        }),
    )
}
