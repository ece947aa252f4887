// Async client for the load-balancing API.
//
// Base path: /v2/lbaas/
// Auth: X-Auth-Token header

use secrecy::SecretString;
use url::Url;

use crate::error::Error;
use crate::http::JsonClient;
use crate::transport::TransportConfig;
use crate::types::{
    LoadBalancerGraph, LoadBalancerGraphEnvelope, LoadBalancerList, LoadBalancerSummary,
};

/// Enumerates load balancers and fetches their full object graphs.
pub struct UpstreamClient {
    inner: JsonClient,
}

impl UpstreamClient {
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

    /// `GET /v2/lbaas/loadbalancers` with each filter forwarded verbatim
    /// as a query parameter.
    pub async fn list_load_balancers(
        &self,
        filters: &[(String, String)],
    ) -> Result<Vec<LoadBalancerSummary>, Error> {
        let list: LoadBalancerList = self
            .inner
            .get_with_params("v2/lbaas/loadbalancers", filters)
            .await?;
        Ok(list.loadbalancers)
    }

    /// `GET /v2/lbaas/loadbalancers/{id}/graph`: the load balancer with
    /// listeners, pools, members and health monitors inlined.
    pub async fn get_load_balancer_graph(&self, lb_id: &str) -> Result<LoadBalancerGraph, Error> {
        let envelope: LoadBalancerGraphEnvelope = self
            .inner
            .get(&format!("v2/lbaas/loadbalancers/{lb_id}/graph"))
            .await?;
        Ok(envelope.loadbalancer)
    }
}
