// ── Load balancer domain types ──

use serde::Serialize;

use super::field::Field;
use super::listener::Listener;
use super::pool::Pool;

/// A secondary VIP on another subnet of the load balancer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdditionalVip {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_id: Option<String>,
}

/// Snapshot of a load balancer and, when provided, its whole object graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadBalancer {
    pub id: String,
    pub vip_address: Field<String>,
    pub vip_network_id: Field<String>,
    pub vip_subnet_id: Field<String>,
    pub vip_port_id: Field<String>,
    pub project_id: Field<String>,
    pub additional_vips: Field<Vec<AdditionalVip>>,
    pub admin_state_up: Field<bool>,
    pub listeners: Field<Vec<Listener>>,
    pub pools: Field<Vec<Pool>>,
}

impl LoadBalancer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }
}
