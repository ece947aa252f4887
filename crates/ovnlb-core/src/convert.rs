// ── API-to-domain type conversions ──
//
// Bridges `ovnlb_api` graph types into `ovnlb_core::model` entities.
// Key-absent attributes become `Field::Unset`, explicit nulls become
// `Field::Null`. Children missing their parent id inherit it.

use ovnlb_api::{
    AdditionalVipGraph, HealthMonitorGraph, ListenerGraph, LoadBalancerGraph, MemberGraph,
    PoolGraph, Present, SessionPersistenceGraph,
};

use crate::model::{
    AdditionalVip, Field, HealthMonitor, Listener, LoadBalancer, Member, Pool, SessionPersistence,
};

// ── Helpers ────────────────────────────────────────────────────────

#[allow(clippy::option_option)]
fn field<T>(raw: Present<T>) -> Field<T> {
    match raw {
        None => Field::Unset,
        Some(None) => Field::Null,
        Some(Some(v)) => Field::Value(v),
    }
}

#[allow(clippy::option_option)]
fn field_map<T, U>(raw: Present<T>, f: impl FnOnce(T) -> U) -> Field<U> {
    match raw {
        None => Field::Unset,
        Some(None) => Field::Null,
        Some(Some(v)) => Field::Value(f(v)),
    }
}

#[allow(clippy::option_option)]
fn parent_id(raw: Present<String>, parent: &str) -> String {
    raw.flatten()
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| parent.to_owned())
}

// ── Conversions ────────────────────────────────────────────────────

impl From<AdditionalVipGraph> for AdditionalVip {
    fn from(g: AdditionalVipGraph) -> Self {
        Self {
            ip_address: g.ip_address,
            subnet_id: g.subnet_id,
            network_id: g.network_id,
            port_id: g.port_id,
        }
    }
}

impl From<SessionPersistenceGraph> for SessionPersistence {
    fn from(g: SessionPersistenceGraph) -> Self {
        Self {
            kind: g.kind,
            cookie_name: g.cookie_name,
            persistence_timeout: g.persistence_timeout,
            persistence_granularity: g.persistence_granularity,
        }
    }
}

impl From<ListenerGraph> for Listener {
    fn from(g: ListenerGraph) -> Self {
        Self {
            id: g.listener_id,
            loadbalancer_id: field(g.loadbalancer_id),
            protocol: field(g.protocol),
            protocol_port: field(g.protocol_port),
            default_pool_id: field(g.default_pool_id),
            admin_state_up: field(g.admin_state_up),
            allowed_cidrs: field(g.allowed_cidrs),
        }
    }
}

fn member_from_graph(g: MemberGraph, pool_id: &str) -> Member {
    Member {
        id: g.member_id,
        pool_id: parent_id(g.pool_id, pool_id),
        address: field(g.address),
        protocol_port: field(g.protocol_port),
        subnet_id: field(g.subnet_id),
        admin_state_up: field(g.admin_state_up),
        monitor_address: field(g.monitor_address),
        monitor_port: field(g.monitor_port),
        weight: field(g.weight),
    }
}

fn health_monitor_from_graph(g: HealthMonitorGraph, pool_id: &str) -> HealthMonitor {
    HealthMonitor {
        id: g.healthmonitor_id,
        pool_id: parent_id(g.pool_id, pool_id),
        kind: field(g.kind),
        delay: field(g.delay),
        timeout: field(g.timeout),
        max_retries: field(g.max_retries),
        max_retries_down: field(g.max_retries_down),
        admin_state_up: field(g.admin_state_up),
    }
}

impl From<PoolGraph> for Pool {
    fn from(g: PoolGraph) -> Self {
        let pool_id = g.pool_id;
        Self {
            loadbalancer_id: field(g.loadbalancer_id),
            listener_id: field(g.listener_id),
            protocol: field(g.protocol),
            lb_algorithm: field(g.lb_algorithm),
            session_persistence: field_map(g.session_persistence, SessionPersistence::from),
            admin_state_up: field(g.admin_state_up),
            healthmonitor: field_map(g.healthmonitor, |hm| {
                health_monitor_from_graph(hm, &pool_id)
            }),
            members: field_map(g.members, |members| {
                members
                    .into_iter()
                    .map(|m| member_from_graph(m, &pool_id))
                    .collect()
            }),
            id: pool_id,
        }
    }
}

impl From<LoadBalancerGraph> for LoadBalancer {
    fn from(g: LoadBalancerGraph) -> Self {
        Self {
            id: g.loadbalancer_id,
            vip_address: field(g.vip_address),
            vip_network_id: field(g.vip_network_id),
            vip_subnet_id: field(g.vip_subnet_id),
            vip_port_id: field(g.vip_port_id),
            project_id: field(g.project_id),
            additional_vips: field_map(g.additional_vips, |vips| {
                vips.into_iter().map(AdditionalVip::from).collect()
            }),
            admin_state_up: field(g.admin_state_up),
            listeners: field_map(g.listeners, |ls| ls.into_iter().map(Listener::from).collect()),
            pools: field_map(g.pools, |ps| ps.into_iter().map(Pool::from).collect()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn presence_maps_to_three_states() {
        assert_eq!(field::<u16>(None), Field::Unset);
        assert_eq!(field::<u16>(Some(None)), Field::Null);
        assert_eq!(field(Some(Some(80u16))), Field::Value(80));
    }

    #[test]
    fn children_inherit_pool_id() {
        let graph = PoolGraph {
            pool_id: "p1".into(),
            members: Some(Some(vec![MemberGraph {
                member_id: "m1".into(),
                address: Some(Some("10.0.0.10".into())),
                ..MemberGraph::default()
            }])),
            healthmonitor: Some(Some(HealthMonitorGraph {
                healthmonitor_id: "hm1".into(),
                pool_id: Some(Some(String::new())),
                ..HealthMonitorGraph::default()
            })),
            ..PoolGraph::default()
        };

        let pool = Pool::from(graph);
        assert_eq!(pool.members.items()[0].pool_id, "p1");
        assert_eq!(pool.healthmonitor.as_option().unwrap().pool_id, "p1");
        assert!(pool.session_persistence.is_unset());
    }

    #[test]
    fn load_balancer_keeps_explicit_nulls() {
        let graph = LoadBalancerGraph {
            loadbalancer_id: "lb1".into(),
            vip_address: Some(Some("10.0.0.5".into())),
            admin_state_up: Some(None),
            ..LoadBalancerGraph::default()
        };
        let lb = LoadBalancer::from(graph);
        assert_eq!(lb.vip_address.non_empty(), Some("10.0.0.5"));
        assert_eq!(lb.admin_state_up, Field::Null);
        assert!(lb.listeners.is_unset());
    }
}
