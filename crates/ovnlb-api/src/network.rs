// Async client for the network API.
//
// Base path: /v2.0/
// Auth: X-Auth-Token header

use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::http::JsonClient;
use crate::transport::TransportConfig;
use crate::types::{
    CreatePortEnvelope, CreatePortRequest, FloatingIp, FloatingIpList, Port, PortEnvelope, Subnet,
    SubnetEnvelope, SubnetList,
};

/// Port, subnet and floating IP queries against the network service.
pub struct NetworkClient {
    inner: JsonClient,
}

impl NetworkClient {
    /// Build from a service token and transport config.
    pub fn from_token(
        base_url: Url,
        token: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_token(token)?;
        Ok(Self::from_reqwest(base_url, http))
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn from_reqwest(base_url: Url, http: reqwest::Client) -> Self {
        Self {
            inner: JsonClient::new(http, base_url),
        }
    }

    pub fn base_url(&self) -> &Url {
        self.inner.base_url()
    }

    // ── Floating IPs ─────────────────────────────────────────────────

    /// Floating IPs associated with `port_id`.
    pub async fn list_floating_ips(&self, port_id: &str) -> Result<Vec<FloatingIp>, Error> {
        let params = [("port_id".to_owned(), port_id.to_owned())];
        let list: FloatingIpList = self
            .inner
            .get_with_params("v2.0/floatingips", &params)
            .await?;
        Ok(list.floatingips)
    }

    // ── Subnets ──────────────────────────────────────────────────────

    pub async fn get_subnet(&self, subnet_id: &str) -> Result<Subnet, Error> {
        let envelope: SubnetEnvelope = self
            .inner
            .get(&format!("v2.0/subnets/{subnet_id}"))
            .await?;
        Ok(envelope.subnet)
    }

    pub async fn list_subnets_on_network(&self, network_id: &str) -> Result<Vec<Subnet>, Error> {
        let params = [("network_id".to_owned(), network_id.to_owned())];
        let list: SubnetList = self.inner.get_with_params("v2.0/subnets", &params).await?;
        Ok(list.subnets)
    }

    // ── Ports ────────────────────────────────────────────────────────

    pub async fn create_port(&self, request: &CreatePortRequest) -> Result<Port, Error> {
        let envelope: PortEnvelope = self
            .inner
            .post("v2.0/ports", &CreatePortEnvelope { port: request })
            .await?;
        Ok(envelope.port)
    }

    pub async fn delete_port(&self, port_id: &str) -> Result<(), Error> {
        self.inner.delete(&format!("v2.0/ports/{port_id}")).await
    }
}
