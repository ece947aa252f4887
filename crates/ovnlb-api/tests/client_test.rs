#![allow(clippy::unwrap_used)]
// Integration tests for `UpstreamClient` and `NetworkClient` using wiremock.

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ovnlb_api::{
    CreatePortRequest, Error, FixedIpRequest, NetworkClient, TransportConfig, UpstreamClient,
};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup_upstream() -> (MockServer, UpstreamClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = UpstreamClient::from_reqwest(base_url, reqwest::Client::new());
    (server, client)
}

async fn setup_network() -> (MockServer, NetworkClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = NetworkClient::from_reqwest(base_url, reqwest::Client::new());
    (server, client)
}

// ── Load balancer listing ───────────────────────────────────────────

#[tokio::test]
async fn test_list_load_balancers_forwards_filters() {
    let (server, client) = setup_upstream().await;

    Mock::given(method("GET"))
        .and(path("/v2/lbaas/loadbalancers"))
        .and(query_param("project_id", "p1"))
        .and(query_param("provider", "ovn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "loadbalancers": [
                {"id": "lb1", "name": "web", "project_id": "p1", "provider": "ovn"},
                {"id": "lb2"}
            ]
        })))
        .mount(&server)
        .await;

    let filters = vec![
        ("project_id".to_owned(), "p1".to_owned()),
        ("provider".to_owned(), "ovn".to_owned()),
    ];
    let lbs = client.list_load_balancers(&filters).await.unwrap();

    let ids: Vec<&str> = lbs.iter().map(|lb| lb.id.as_str()).collect();
    assert_eq!(ids, vec!["lb1", "lb2"]);
    assert_eq!(lbs[0].name.as_deref(), Some("web"));
    assert_eq!(lbs[1].name, None);
}

#[tokio::test]
async fn test_token_header_is_sent() {
    let server = MockServer::start().await;
    let token = SecretString::from("s3cret".to_owned());
    let client = UpstreamClient::from_token(
        Url::parse(&server.uri()).unwrap(),
        &token,
        &TransportConfig::default(),
    )
    .unwrap();

    Mock::given(method("GET"))
        .and(path("/v2/lbaas/loadbalancers"))
        .and(header("X-Auth-Token", "s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"loadbalancers": []})))
        .expect(1)
        .mount(&server)
        .await;

    assert!(client.list_load_balancers(&[]).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_token() {
    let (server, client) = setup_upstream().await;

    Mock::given(method("GET"))
        .and(path("/v2/lbaas/loadbalancers"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_load_balancers(&[]).await;
    assert!(
        matches!(result, Err(Error::InvalidToken)),
        "expected InvalidToken, got: {result:?}"
    );
}

// ── Load balancer graph ─────────────────────────────────────────────

#[tokio::test]
async fn test_get_graph_keeps_unset_and_null() {
    let (server, client) = setup_upstream().await;

    Mock::given(method("GET"))
        .and(path("/v2/lbaas/loadbalancers/lb1/graph"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "loadbalancer": {
                "loadbalancer_id": "lb1",
                "vip_address": "10.0.0.5",
                "vip_network_id": "net1",
                "vip_port_id": null,
                "listeners": [{
                    "listener_id": "l1",
                    "protocol": "TCP",
                    "protocol_port": 80,
                    "loadbalancer_id": "lb1"
                }],
                "pools": [{
                    "pool_id": "p1",
                    "protocol": "TCP",
                    "lb_algorithm": "SOURCE_IP_PORT",
                    "members": [{"member_id": "m1", "address": "10.0.0.10", "protocol_port": 8080}],
                    "healthmonitor": null
                }]
            }
        })))
        .mount(&server)
        .await;

    let graph = client.get_load_balancer_graph("lb1").await.unwrap();

    assert_eq!(graph.loadbalancer_id, "lb1");
    assert_eq!(graph.vip_port_id, Some(None));
    assert_eq!(graph.admin_state_up, None);

    let pools = graph.pools.flatten().unwrap();
    assert_eq!(pools.len(), 1);
    assert!(matches!(pools[0].healthmonitor, Some(None)));
    let members = pools[0].members.clone().flatten().unwrap();
    assert_eq!(members[0].subnet_id, None);
}

#[tokio::test]
async fn test_graph_not_found() {
    let (server, client) = setup_upstream().await;

    Mock::given(method("GET"))
        .and(path("/v2/lbaas/loadbalancers/missing/graph"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "faultstring": "Load Balancer missing not found."
        })))
        .mount(&server)
        .await;

    let err = client.get_load_balancer_graph("missing").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.api_message(), Some("Load Balancer missing not found."));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup_upstream().await;

    Mock::given(method("GET"))
        .and(path("/v2/lbaas/loadbalancers"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.list_load_balancers(&[]).await;
    assert!(matches!(result, Err(Error::Deserialization { .. })));
}

// ── Floating IPs ────────────────────────────────────────────────────

#[tokio::test]
async fn test_list_floating_ips_by_port() {
    let (server, client) = setup_network().await;

    Mock::given(method("GET"))
        .and(path("/v2.0/floatingips"))
        .and(query_param("port_id", "vip-port"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "floatingips": [{
                "id": "fip1",
                "floating_ip_address": "172.24.4.10",
                "port_id": "vip-port",
                "fixed_ip_address": "10.0.0.5"
            }]
        })))
        .mount(&server)
        .await;

    let fips = client.list_floating_ips("vip-port").await.unwrap();
    assert_eq!(fips.len(), 1);
    assert_eq!(fips[0].floating_ip_address, "172.24.4.10");
}

#[tokio::test]
async fn test_network_error_body_is_parsed() {
    let (server, client) = setup_network().await;

    Mock::given(method("GET"))
        .and(path("/v2.0/floatingips"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "NeutronError": {"type": "InternalError", "message": "db unavailable"}
        })))
        .mount(&server)
        .await;

    let err = client.list_floating_ips("p").await.unwrap_err();
    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "db unavailable");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

// ── Subnets ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_subnet_and_list_by_network() {
    let (server, client) = setup_network().await;

    Mock::given(method("GET"))
        .and(path("/v2.0/subnets/sub1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subnet": {"id": "sub1", "network_id": "net1", "cidr": "10.0.0.0/24", "ip_version": 4}
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2.0/subnets"))
        .and(query_param("network_id", "net1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subnets": [
                {"id": "sub1", "network_id": "net1", "cidr": "10.0.0.0/24"},
                {"id": "sub6", "network_id": "net1", "cidr": "fd00::/64"}
            ]
        })))
        .mount(&server)
        .await;

    let subnet = client.get_subnet("sub1").await.unwrap();
    assert_eq!(subnet.cidr, "10.0.0.0/24");
    assert_eq!(subnet.ip_version, Some(4));

    let subnets = client.list_subnets_on_network("net1").await.unwrap();
    let cidrs: Vec<&str> = subnets.iter().map(|s| s.cidr.as_str()).collect();
    assert_eq!(cidrs, vec!["10.0.0.0/24", "fd00::/64"]);
}

// ── Ports ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_create_port() {
    let (server, client) = setup_network().await;

    Mock::given(method("POST"))
        .and(path("/v2.0/ports"))
        .and(body_partial_json(json!({
            "port": {"name": "ovn-lb-vip-lb1", "network_id": "net1", "project_id": "proj"}
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "port": {
                "id": "port1",
                "network_id": "net1",
                "name": "ovn-lb-vip-lb1",
                "fixed_ips": [{"subnet_id": "sub1", "ip_address": "10.0.0.5"}]
            }
        })))
        .mount(&server)
        .await;

    let request = CreatePortRequest {
        name: "ovn-lb-vip-lb1".into(),
        network_id: "net1".into(),
        project_id: Some("proj".into()),
        admin_state_up: true,
        device_owner: None,
        fixed_ips: vec![FixedIpRequest {
            subnet_id: Some("sub1".into()),
            ip_address: None,
        }],
    };
    let port = client.create_port(&request).await.unwrap();

    assert_eq!(port.id, "port1");
    assert_eq!(port.primary_fixed_ip().unwrap().ip_address, "10.0.0.5");
}

#[tokio::test]
async fn test_create_port_conflict() {
    let (server, client) = setup_network().await;

    Mock::given(method("POST"))
        .and(path("/v2.0/ports"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "NeutronError": {"type": "IpAddressAlreadyAllocated", "message": "IP already allocated"}
        })))
        .mount(&server)
        .await;

    let request = CreatePortRequest {
        name: "ovn-lb-vip-lb1".into(),
        network_id: "net1".into(),
        project_id: None,
        admin_state_up: true,
        device_owner: None,
        fixed_ips: Vec::new(),
    };
    let err = client.create_port(&request).await.unwrap_err();
    assert_eq!(err.api_message(), Some("IP already allocated"));
}

#[tokio::test]
async fn test_delete_port() {
    let (server, client) = setup_network().await;

    Mock::given(method("DELETE"))
        .and(path("/v2.0/ports/port-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.delete_port("port-1").await.unwrap();
}

#[tokio::test]
async fn test_delete_missing_port_is_not_found() {
    let (server, client) = setup_network().await;

    Mock::given(method("DELETE"))
        .and(path("/v2.0/ports/gone"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "NeutronError": {"type": "PortNotFound", "message": "Port gone could not be found."}
        })))
        .mount(&server)
        .await;

    let err = client.delete_port("gone").await.unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.api_message(), Some("Port gone could not be found."));
}
