// ── Wire types ──
//
// Request and response bodies for the load-balancing and network APIs.
// Graph attributes keep the "key absent" vs "explicit null" distinction
// through `Present<T>` so the core can tell unset fields from cleared ones.

use serde::{Deserialize, Deserializer, Serialize};

/// Outer `None`: key absent from the payload. `Some(None)`: explicit `null`.
pub type Present<T> = Option<Option<T>>;

/// Deserialize a field that is present in the payload, null or not.
///
/// Combined with `#[serde(default)]`, absent keys stay `None`.
#[allow(clippy::option_option)]
fn present<'de, D, T>(de: D) -> Result<Present<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}

// ── Load-balancing API ──────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoadBalancerList {
    pub loadbalancers: Vec<LoadBalancerSummary>,
}

/// One row of the load balancer listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoadBalancerSummary {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub provider: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct LoadBalancerGraphEnvelope {
    pub loadbalancer: LoadBalancerGraph,
}

/// Full provider view of a load balancer and all of its children.
#[derive(Debug, Clone, Default, Deserialize)]
#[allow(clippy::option_option)]
pub struct LoadBalancerGraph {
    pub loadbalancer_id: String,
    #[serde(default, deserialize_with = "present")]
    pub vip_address: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub vip_network_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub vip_subnet_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub vip_port_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub project_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub additional_vips: Present<Vec<AdditionalVipGraph>>,
    #[serde(default, deserialize_with = "present")]
    pub admin_state_up: Present<bool>,
    #[serde(default, deserialize_with = "present")]
    pub listeners: Present<Vec<ListenerGraph>>,
    #[serde(default, deserialize_with = "present")]
    pub pools: Present<Vec<PoolGraph>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalVipGraph {
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub network_id: Option<String>,
    #[serde(default)]
    pub port_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(clippy::option_option)]
pub struct ListenerGraph {
    pub listener_id: String,
    #[serde(default, deserialize_with = "present")]
    pub loadbalancer_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub protocol: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub protocol_port: Present<u16>,
    #[serde(default, deserialize_with = "present")]
    pub default_pool_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub admin_state_up: Present<bool>,
    #[serde(default, deserialize_with = "present")]
    pub allowed_cidrs: Present<Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(clippy::option_option)]
pub struct PoolGraph {
    pub pool_id: String,
    #[serde(default, deserialize_with = "present")]
    pub loadbalancer_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub listener_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub protocol: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub lb_algorithm: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub session_persistence: Present<SessionPersistenceGraph>,
    #[serde(default, deserialize_with = "present")]
    pub admin_state_up: Present<bool>,
    #[serde(default, deserialize_with = "present")]
    pub healthmonitor: Present<HealthMonitorGraph>,
    #[serde(default, deserialize_with = "present")]
    pub members: Present<Vec<MemberGraph>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionPersistenceGraph {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub cookie_name: Option<String>,
    #[serde(default)]
    pub persistence_timeout: Option<u64>,
    #[serde(default)]
    pub persistence_granularity: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(clippy::option_option)]
pub struct MemberGraph {
    pub member_id: String,
    #[serde(default, deserialize_with = "present")]
    pub pool_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub address: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub protocol_port: Present<u16>,
    #[serde(default, deserialize_with = "present")]
    pub subnet_id: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub admin_state_up: Present<bool>,
    #[serde(default, deserialize_with = "present")]
    pub monitor_address: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub monitor_port: Present<u16>,
    #[serde(default, deserialize_with = "present")]
    pub weight: Present<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[allow(clippy::option_option)]
pub struct HealthMonitorGraph {
    pub healthmonitor_id: String,
    #[serde(default, deserialize_with = "present")]
    pub pool_id: Present<String>,
    #[serde(default, rename = "type", deserialize_with = "present")]
    pub kind: Present<String>,
    #[serde(default, deserialize_with = "present")]
    pub delay: Present<u32>,
    #[serde(default, deserialize_with = "present")]
    pub timeout: Present<u32>,
    #[serde(default, deserialize_with = "present")]
    pub max_retries: Present<u32>,
    #[serde(default, deserialize_with = "present")]
    pub max_retries_down: Present<u32>,
    #[serde(default, deserialize_with = "present")]
    pub admin_state_up: Present<bool>,
}

// ── Network API ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct FloatingIpList {
    pub floatingips: Vec<FloatingIp>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FloatingIp {
    pub id: String,
    pub floating_ip_address: String,
    #[serde(default)]
    pub port_id: Option<String>,
    #[serde(default)]
    pub fixed_ip_address: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubnetEnvelope {
    pub subnet: Subnet,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct SubnetList {
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Subnet {
    pub id: String,
    pub network_id: String,
    pub cidr: String,
    #[serde(default)]
    pub ip_version: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct PortEnvelope {
    pub port: Port,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Port {
    pub id: String,
    pub network_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub fixed_ips: Vec<FixedIp>,
}

impl Port {
    /// The first fixed IP, which carries the address the port was allocated.
    pub fn primary_fixed_ip(&self) -> Option<&FixedIp> {
        self.fixed_ips.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FixedIp {
    pub subnet_id: String,
    pub ip_address: String,
}

/// Body of `POST /v2.0/ports`.
#[derive(Debug, Clone, Serialize)]
pub struct CreatePortRequest {
    pub name: String,
    pub network_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub admin_state_up: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_owner: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fixed_ips: Vec<FixedIpRequest>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct FixedIpRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct CreatePortEnvelope<'a> {
    pub port: &'a CreatePortRequest,
}
