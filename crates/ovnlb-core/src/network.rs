// ── Network layer seam ──
//
// Port allocation, floating IP and subnet lookups. The driver is generic
// over this trait; `NetworkClient` is the HTTP implementation.

use std::future::Future;

use ovnlb_api::{CreatePortRequest, Error, FixedIpRequest, NetworkClient, Subnet};

/// Owner tag written on ports allocated for load balancer VIPs.
pub const VIP_PORT_DEVICE_OWNER: &str = "Octavia";

/// Parameters for one VIP port allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortRequest {
    pub name: String,
    pub project_id: Option<String>,
    pub network_id: String,
    pub subnet_id: Option<String>,
    pub ip_address: Option<String>,
}

/// Result of a successful allocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllocatedPort {
    pub port_id: String,
    pub network_id: String,
    pub subnet_id: Option<String>,
    pub ip_address: Option<String>,
}

pub trait NetworkLayer: Send + Sync {
    fn allocate_port(
        &self,
        request: &PortRequest,
    ) -> impl Future<Output = Result<AllocatedPort, Error>> + Send;

    /// Delete a port allocated by [`NetworkLayer::allocate_port`].
    fn release_port(&self, port_id: &str) -> impl Future<Output = Result<(), Error>> + Send;

    /// Floating IP addresses bound to `port_id`.
    fn floating_ips(&self, port_id: &str) -> impl Future<Output = Result<Vec<String>, Error>> + Send;

    fn subnet(&self, subnet_id: &str) -> impl Future<Output = Result<Subnet, Error>> + Send;

    fn network_subnets(
        &self,
        network_id: &str,
    ) -> impl Future<Output = Result<Vec<Subnet>, Error>> + Send;
}

impl NetworkLayer for NetworkClient {
    async fn allocate_port(&self, request: &PortRequest) -> Result<AllocatedPort, Error> {
        let fixed_ips = if request.subnet_id.is_some() || request.ip_address.is_some() {
            vec![FixedIpRequest {
                subnet_id: request.subnet_id.clone(),
                ip_address: request.ip_address.clone(),
            }]
        } else {
            Vec::new()
        };
        let body = CreatePortRequest {
            name: request.name.clone(),
            network_id: request.network_id.clone(),
            project_id: request.project_id.clone(),
            admin_state_up: true,
            device_owner: Some(VIP_PORT_DEVICE_OWNER.to_owned()),
            fixed_ips,
        };

        let port = self.create_port(&body).await?;
        let fixed = port.primary_fixed_ip();
        Ok(AllocatedPort {
            subnet_id: fixed.map(|f| f.subnet_id.clone()),
            ip_address: fixed.map(|f| f.ip_address.clone()),
            port_id: port.id,
            network_id: port.network_id,
        })
    }

    async fn release_port(&self, port_id: &str) -> Result<(), Error> {
        self.delete_port(port_id).await
    }

    async fn floating_ips(&self, port_id: &str) -> Result<Vec<String>, Error> {
        Ok(self
            .list_floating_ips(port_id)
            .await?
            .into_iter()
            .map(|fip| fip.floating_ip_address)
            .collect())
    }

    async fn subnet(&self, subnet_id: &str) -> Result<Subnet, Error> {
        self.get_subnet(subnet_id).await
    }

    async fn network_subnets(&self, network_id: &str) -> Result<Vec<Subnet>, Error> {
        self.list_subnets_on_network(network_id).await
    }
}
