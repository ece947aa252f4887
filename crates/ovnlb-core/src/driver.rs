// ── Driver façade ──
//
// Entry points per entity and lifecycle event. Each call validates, then
// emits its change requests to the applier channel. A failing call emits
// nothing of its own; requests sent by earlier calls of a cascade stay
// sent.

use std::sync::Arc;

use tokio::sync::{OnceCell, mpsc};
use tracing::{debug, warn};

use crate::backend::{Backend, BackendError, find_lb_by_pool_id, pool_key};
use crate::config::DriverConfig;
use crate::dvr;
use crate::encoding::MemberInfo;
use crate::error::{CoreError, UNKNOWN_DRIVER_ERROR};
use crate::model::{Field, HealthMonitor, Listener, LoadBalancer, Member, Pool};
use crate::network::{NetworkLayer, PortRequest};
use crate::request::normalize;
use crate::request::{ChangeRequest, Operation};
use crate::subnet::{
    MemberAction, address_in_cidr, cascade_subnet, resolve_subnet, subnet_of_record,
    subnet_required,
};
use crate::validate;

/// Name prefix of ports allocated for a load balancer's primary VIP.
pub const VIP_PORT_PREFIX: &str = "ovn-lb-vip-";
/// Name prefix of ports allocated for additional VIPs.
pub const ADDITIONAL_VIP_PORT_PREFIX: &str = "ovn-lb-vip-additional-";

/// Requested VIP placement for `create_vip_port`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VipRequest {
    pub network_id: String,
    pub subnet_id: Option<String>,
    pub ip_address: Option<String>,
}

/// A provisioned VIP port.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VipPort {
    pub port_id: String,
    pub ip_address: String,
    pub network_id: String,
    pub subnet_id: Option<String>,
}

/// Load balancer driver over a backend, a network layer and an upstream
/// source of truth.
pub struct Driver<B, N, U> {
    pub(crate) backend: Arc<B>,
    pub(crate) network: Arc<N>,
    pub(crate) upstream: Arc<U>,
    pub(crate) config: DriverConfig,
    applier: mpsc::UnboundedSender<ChangeRequest>,
    health_checks: OnceCell<bool>,
}

impl<B, N, U> Driver<B, N, U>
where
    B: Backend,
    N: NetworkLayer,
{
    /// Build a driver and the receiving end of its applier queue.
    pub fn new(
        backend: Arc<B>,
        network: Arc<N>,
        upstream: Arc<U>,
        config: DriverConfig,
    ) -> (Self, mpsc::UnboundedReceiver<ChangeRequest>) {
        let (applier, rx) = mpsc::unbounded_channel();
        let driver = Self {
            backend,
            network,
            upstream,
            config,
            applier,
            health_checks: OnceCell::new(),
        };
        (driver, rx)
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    // ── Applier ──────────────────────────────────────────────────────

    pub(crate) fn submit(&self, requests: Vec<ChangeRequest>) -> Result<(), CoreError> {
        for request in requests {
            debug!(op = %request.op(), "submitting change request");
            self.applier
                .send(request)
                .map_err(|_| CoreError::ApplierClosed)?;
        }
        Ok(())
    }

    pub(crate) fn submit_one(&self, request: ChangeRequest) -> Result<(), CoreError> {
        self.submit(vec![request])
    }

    // ── Shared checks ────────────────────────────────────────────────

    /// Backend health-check capability, queried once per driver.
    async fn health_checks_supported(&self) -> Result<bool, CoreError> {
        self.health_checks
            .get_or_try_init(|| async {
                self.backend
                    .supports_health_checks()
                    .await
                    .map_err(CoreError::from)
            })
            .await
            .copied()
    }

    /// Whether the member address conflicts with the IP family of the VIPs
    /// of its pool's load balancer.
    async fn member_ip_version_differs(&self, member: &Member) -> Result<bool, CoreError> {
        let Some(address) = member.address.non_empty() else {
            return Ok(false);
        };
        Ok(find_lb_by_pool_id(self.backend.as_ref(), &member.pool_id)
            .await?
            .is_some_and(|(_, record)| validate::ip_version_differs(&record.vips(), address)))
    }

    // ── Load balancer ────────────────────────────────────────────────

    /// Create a load balancer and cascade into its listeners, pools, health
    /// monitors and members.
    pub async fn loadbalancer_create(&self, lb: &LoadBalancer) -> Result<(), CoreError> {
        self.submit_one(normalize::load_balancer(lb, Operation::LbCreate))?;

        for listener in lb.listeners.items() {
            self.listener_create(listener)?;
        }
        for pool in lb.pools.items() {
            self.pool_create(pool).await?;
            for member in pool.members.items() {
                let mut member = member.clone();
                if member.subnet_id.non_empty().is_none() {
                    if let Some(subnet) = cascade_subnet(self.network.as_ref(), lb, &member).await? {
                        member.subnet_id = Field::Value(subnet);
                    }
                }
                self.member_create(&member).await?;
            }
        }
        Ok(())
    }

    pub fn loadbalancer_update(&self, new: &LoadBalancer) -> Result<(), CoreError> {
        self.submit_one(normalize::load_balancer_update(new))
    }

    pub fn loadbalancer_delete(
        &self,
        lb: &LoadBalancer,
        cascade: bool,
    ) -> Result<(), CoreError> {
        self.submit_one(normalize::load_balancer_delete(lb, cascade))
    }

    pub fn loadbalancer_failover(&self, lb_id: &str) -> Result<(), CoreError> {
        debug!(lb_id, "failover requested");
        Err(CoreError::unsupported(
            "OVN provider does not support loadbalancer failover",
        ))
    }

    /// Allocate the VIP port and every additional VIP port of a load
    /// balancer. On failure, ports already allocated by this call are
    /// released before the error is returned.
    pub async fn create_vip_port(
        &self,
        lb_id: &str,
        project_id: Option<&str>,
        vip: &VipRequest,
        additional_vips: &[VipRequest],
    ) -> Result<(VipPort, Vec<VipPort>), CoreError> {
        let allocate = |name: String, request: &VipRequest| PortRequest {
            name,
            project_id: project_id.map(str::to_owned),
            network_id: request.network_id.clone(),
            subnet_id: request.subnet_id.clone(),
            ip_address: request.ip_address.clone(),
        };

        let primary = self
            .allocate_vip(&allocate(format!("{VIP_PORT_PREFIX}{lb_id}"), vip))
            .await?;

        let mut additional: Vec<VipPort> = Vec::with_capacity(additional_vips.len());
        for (idx, request) in additional_vips.iter().enumerate() {
            let name = format!("{ADDITIONAL_VIP_PORT_PREFIX}{idx}-{lb_id}");
            match self.allocate_vip(&allocate(name, request)).await {
                Ok(port) => additional.push(port),
                Err(e) => {
                    for port in std::iter::once(&primary).chain(&additional) {
                        self.release_vip_port(&port.port_id).await;
                    }
                    return Err(e);
                }
            }
        }
        Ok((primary, additional))
    }

    async fn allocate_vip(&self, request: &PortRequest) -> Result<VipPort, CoreError> {
        let port = self
            .network
            .allocate_port(request)
            .await
            .map_err(|e| CoreError::Driver {
                message: e.api_message().unwrap_or(UNKNOWN_DRIVER_ERROR).to_owned(),
            })?;
        debug!(port_id = %port.port_id, name = %request.name, "VIP port allocated");

        let Some(ip_address) = port.ip_address else {
            warn!(port_id = %port.port_id, name = %request.name, "VIP port has no fixed IP");
            self.release_vip_port(&port.port_id).await;
            return Err(CoreError::Driver {
                message: UNKNOWN_DRIVER_ERROR.to_owned(),
            });
        };
        Ok(VipPort {
            port_id: port.port_id,
            ip_address,
            network_id: port.network_id,
            subnet_id: port.subnet_id,
        })
    }

    /// Release failures are logged; the allocation error is what callers see.
    async fn release_vip_port(&self, port_id: &str) {
        match self.network.release_port(port_id).await {
            Ok(()) => debug!(port_id, "VIP port released"),
            Err(e) => warn!(port_id, error = %e, "failed to release VIP port"),
        }
    }

    // ── Listener ─────────────────────────────────────────────────────

    pub fn listener_create(&self, listener: &Listener) -> Result<(), CoreError> {
        self.listener_create_or_sync(listener, Operation::ListenerCreate)
    }

    pub(crate) fn listener_create_or_sync(
        &self,
        listener: &Listener,
        op: Operation,
    ) -> Result<(), CoreError> {
        validate::validate_protocol(&listener.protocol)?;
        validate::validate_allowed_cidrs(&listener.allowed_cidrs)?;
        self.submit_one(normalize::listener(listener, op))
    }

    pub fn listener_update(&self, old: &Listener, new: &Listener) -> Result<(), CoreError> {
        validate::validate_allowed_cidrs(&new.allowed_cidrs)?;
        self.submit_one(normalize::listener_update(old, new))
    }

    pub fn listener_delete(&self, listener: &Listener) -> Result<(), CoreError> {
        self.submit_one(normalize::listener_delete(listener))
    }

    // ── Pool ─────────────────────────────────────────────────────────

    /// Create a pool, then its health monitor if it has one.
    pub async fn pool_create(&self, pool: &Pool) -> Result<(), CoreError> {
        self.pool_create_or_sync(pool, Operation::PoolCreate)?;
        if let Some(hm) = pool.healthmonitor.as_option() {
            self.health_monitor_create(hm).await?;
        }
        Ok(())
    }

    pub(crate) fn pool_create_or_sync(&self, pool: &Pool, op: Operation) -> Result<(), CoreError> {
        validate::validate_protocol(&pool.protocol)?;
        validate::validate_algorithm(&pool.lb_algorithm)?;
        validate::validate_session_persistence(pool.session_persistence.as_option())?;
        self.submit_one(normalize::pool(pool, op))
    }

    pub fn pool_update(&self, old: &Pool, new: &Pool) -> Result<(), CoreError> {
        if new.protocol.is_set() {
            validate::validate_protocol(&new.protocol)?;
        }
        if new.lb_algorithm.is_set() {
            validate::validate_algorithm(&new.lb_algorithm)?;
        }
        if new.session_persistence.is_set() {
            validate::validate_session_persistence(new.session_persistence.as_option())?;
        }
        self.submit_one(normalize::pool_update(old, new))
    }

    /// Delete a pool after its health monitor and every member.
    pub async fn pool_delete(&self, pool: &Pool) -> Result<(), CoreError> {
        if let Some(hm) = pool.healthmonitor.as_option() {
            self.health_monitor_delete(hm)?;
        }
        for member in pool.members.items() {
            self.member_delete(member).await?;
        }
        self.submit_one(normalize::pool_delete(pool))
    }

    // ── Member ───────────────────────────────────────────────────────

    /// Create a member. Emits the member request and its DVR notice.
    pub async fn member_create(&self, member: &Member) -> Result<(), CoreError> {
        self.member_create_or_sync(member, Operation::MemberCreate)
            .await
    }

    /// Like create, without the IP-version check.
    pub async fn member_sync(&self, member: &Member) -> Result<(), CoreError> {
        self.member_create_or_sync(member, Operation::MemberSync)
            .await
    }

    async fn member_create_or_sync(&self, member: &Member, op: Operation) -> Result<(), CoreError> {
        validate::validate_member_monitor_options(member)?;
        if op == Operation::MemberCreate && self.member_ip_version_differs(member).await? {
            return Err(CoreError::IpVersionMixing);
        }
        let subnet = resolve_subnet(
            self.backend.as_ref(),
            self.network.as_ref(),
            member,
            MemberAction::Creation,
        )
        .await?;

        self.submit(vec![
            normalize::member(member, Some(&subnet), op),
            dvr::member_added(member, &subnet),
        ])
    }

    /// Delete a member. A missing subnet is resolved like on create.
    pub async fn member_delete(&self, member: &Member) -> Result<(), CoreError> {
        let subnet = resolve_subnet(
            self.backend.as_ref(),
            self.network.as_ref(),
            member,
            MemberAction::Deletion,
        )
        .await?;

        self.submit(vec![
            normalize::member_delete(
                &member.id,
                member.address.to_json(),
                member.protocol_port.to_json(),
                &member.pool_id,
                Some(&subnet),
            ),
            dvr::member_deleted(member, &subnet),
        ])
    }

    pub async fn member_update(&self, old: &Member, new: &Member) -> Result<(), CoreError> {
        validate::validate_member_monitor_options(new)?;
        if self.member_ip_version_differs(new).await? {
            return Err(CoreError::IpVersionMixing);
        }
        self.submit_one(normalize::member_update(old, new))
    }

    /// Replace the member set of a pool.
    ///
    /// Every member is validated before anything is emitted. Members already
    /// recorded become updates, new ones creates, and recorded members
    /// missing from `members` are deleted.
    pub async fn member_batch_update(
        &self,
        pool_id: &str,
        members: &[Member],
    ) -> Result<(), CoreError> {
        let (key, record) = find_lb_by_pool_id(self.backend.as_ref(), pool_id)
            .await?
            .ok_or_else(|| BackendError::RowNotFound {
                table: "Load_Balancer",
                id: pool_key(pool_id),
            })?;
        let vips = record.vips();
        let mut to_delete = record.members(&key);
        let mut pool_subnet: Option<Option<(String, String)>> = None;
        let mut requests = Vec::with_capacity(members.len());

        for member in members {
            if validate::monitor_options_requested(member) {
                return Err(CoreError::unsupported(
                    "OVN provider does not support monitor options",
                ));
            }
            let address = member.address.non_empty().unwrap_or_default();
            if !address.is_empty() && validate::ip_version_differs(&vips, address) {
                return Err(CoreError::IpVersionMixing);
            }

            let subnet = match member.subnet_id.non_empty() {
                Some(subnet) => subnet.to_owned(),
                None => {
                    if pool_subnet.is_none() {
                        pool_subnet = Some(subnet_of_record(self.network.as_ref(), &record).await?);
                    }
                    match pool_subnet.as_ref().and_then(Option::as_ref) {
                        Some((id, cidr)) if address_in_cidr(address, cidr) => id.clone(),
                        _ => return Err(subnet_required(MemberAction::BatchUpdate)),
                    }
                }
            };

            let info = MemberInfo::new(
                member.id.as_str(),
                address,
                member.protocol_port.as_option().copied().unwrap_or_default(),
                Some(subnet.clone()),
            );
            let op = match to_delete.iter().position(|existing| *existing == info) {
                Some(idx) => {
                    to_delete.remove(idx);
                    Operation::MemberUpdate
                }
                None => Operation::MemberCreate,
            };
            requests.push(normalize::member(member, Some(&subnet), op));
        }

        for info in &to_delete {
            requests.push(dvr::recorded_member_delete(info, pool_id));
            requests.push(dvr::recorded_member_deleted(info, pool_id));
        }

        debug!(
            pool_id,
            requests = requests.len(),
            removed = to_delete.len(),
            "member batch update"
        );
        self.submit(requests)
    }

    // ── Health monitor ───────────────────────────────────────────────

    pub async fn health_monitor_create(&self, hm: &HealthMonitor) -> Result<(), CoreError> {
        self.health_monitor_create_or_sync(hm, Operation::HmCreate)
            .await
    }

    pub(crate) async fn health_monitor_create_or_sync(
        &self,
        hm: &HealthMonitor,
        op: Operation,
    ) -> Result<(), CoreError> {
        validate::validate_health_monitor(hm, self.health_checks_supported().await?, true)?;
        self.submit_one(normalize::health_monitor(hm, op))
    }

    pub async fn health_monitor_update(
        &self,
        old: &HealthMonitor,
        new: &HealthMonitor,
    ) -> Result<(), CoreError> {
        validate::validate_health_monitor(new, self.health_checks_supported().await?, false)?;
        self.submit_one(normalize::health_monitor_update(old, new))
    }

    pub fn health_monitor_delete(&self, hm: &HealthMonitor) -> Result<(), CoreError> {
        self.submit_one(normalize::health_monitor_delete(hm))
    }
}
