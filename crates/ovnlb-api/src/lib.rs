// ovnlb-api: async clients for the load-balancing and network APIs

pub mod error;
mod http;
pub mod network;
pub mod transport;
pub mod types;
pub mod upstream;

pub use error::Error;
pub use network::NetworkClient;
pub use transport::{TlsMode, TransportConfig};
pub use types::{
    AdditionalVipGraph, CreatePortRequest, FixedIp, FixedIpRequest, FloatingIp,
    HealthMonitorGraph, ListenerGraph, LoadBalancerGraph, LoadBalancerSummary, MemberGraph,
    PoolGraph, Port, Present, SessionPersistenceGraph, Subnet,
};
pub use upstream::UpstreamClient;
