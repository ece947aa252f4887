// ── Upstream seam ──
//
// Source of truth enumerated during sync. `UpstreamClient` is the HTTP
// implementation; tests substitute an in-memory map.

use std::future::Future;

use ovnlb_api::UpstreamClient;

use crate::error::CoreError;
use crate::model::LoadBalancer;

pub trait Upstream: Send + Sync {
    /// Ids of load balancers matching `filters`, forwarded verbatim.
    fn list_load_balancer_ids(
        &self,
        filters: &[(String, String)],
    ) -> impl Future<Output = Result<Vec<String>, CoreError>> + Send;

    /// The full object graph of one load balancer.
    fn load_balancer(&self, lb_id: &str)
    -> impl Future<Output = Result<LoadBalancer, CoreError>> + Send;
}

impl Upstream for UpstreamClient {
    async fn list_load_balancer_ids(
        &self,
        filters: &[(String, String)],
    ) -> Result<Vec<String>, CoreError> {
        Ok(self
            .list_load_balancers(filters)
            .await?
            .into_iter()
            .map(|lb| lb.id)
            .collect())
    }

    async fn load_balancer(&self, lb_id: &str) -> Result<LoadBalancer, CoreError> {
        Ok(self.get_load_balancer_graph(lb_id).await?.into())
    }
}
