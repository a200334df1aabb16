//! Static address configuration of boot interfaces against a mock MAAS.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use maas_client::resources::{IpConfigurationUpdate, LinkMode, NetworkInterface};
use maas_client::MaasError;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{api_path, machine_json, setup};

async fn mount_link_calls(server: &MockServer, interface_path: &str, expected: u64) {
    Mock::given(method("POST"))
        .and(path(api_path(interface_path)))
        .and(body_string_contains("op=unlink_subnet"))
        .and(body_string_contains("id=77"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(expected)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(api_path(interface_path)))
        .and(body_string_contains("op=link_subnet"))
        .and(body_string_contains("subnet=3"))
        .and(body_string_contains("mode=static"))
        .and(body_string_contains("ip_address=10.0.0.50"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(expected)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_static_ip_on_direct_links() {
    let (server, clients) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("/machines/abc/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine_json("abc", 5, &[])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/nodes/abc/interfaces/5/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5,
            "name": "eth0",
            "type": "physical",
            "children": [],
            "links": [
                {"id": 76, "mode": "link_up"},
                {"id": 77, "mode": "dhcp", "subnet": {"id": 3, "cidr": "10.0.0.0/24"}}
            ]
        })))
        .mount(&server)
        .await;
    mount_link_calls(&server, "/nodes/abc/interfaces/5/", 1).await;

    clients
        .network_interfaces()
        .set_boot_interface_static_ip("abc", "10.0.0.50".parse().unwrap())
        .await
        .unwrap();

    // Unlink must precede the relink.
    let bodies: Vec<String> = server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|r| r.method.as_str() == "POST")
        .map(|r| String::from_utf8_lossy(&r.body).into_owned())
        .collect();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].contains("op=unlink_subnet"));
    assert!(bodies[1].contains("op=link_subnet"));
}

#[tokio::test]
async fn test_static_ip_follows_bridge_to_child() {
    let (server, clients) = setup().await;

    let parent = json!({"id": 5, "name": "eth0", "type": "physical", "links": [], "children": ["br0"]});
    let bridge = json!({
        "id": 9,
        "name": "br0",
        "type": "bridge",
        "children": [],
        "links": [{"id": 77, "mode": "dhcp", "subnet": {"id": 3, "cidr": "10.0.0.0/24"}}]
    });

    Mock::given(method("GET"))
        .and(path(api_path("/machines/abc/")))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(machine_json("abc", 5, &["br0"])),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/nodes/abc/interfaces/5/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(parent.clone()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(api_path("/nodes/abc/interfaces/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([parent, bridge])))
        .expect(1)
        .mount(&server)
        .await;
    mount_link_calls(&server, "/nodes/abc/interfaces/9/", 1).await;
    Mock::given(method("POST"))
        .and(path(api_path("/nodes/abc/interfaces/5/")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    clients
        .network_interfaces()
        .set_boot_interface_static_ip("abc", "10.0.0.50".parse().unwrap())
        .await
        .unwrap();
}

#[tokio::test]
async fn test_bridge_without_linked_child_fails() {
    let (server, clients) = setup().await;

    let parent = json!({"id": 5, "name": "eth0", "links": [], "children": ["br0"]});
    let bridge = json!({"id": 9, "name": "br0", "links": [], "children": []});

    Mock::given(method("GET"))
        .and(path(api_path("/nodes/abc/interfaces/")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([parent.clone(), bridge])))
        .mount(&server)
        .await;

    let iface: NetworkInterface = serde_json::from_value(parent).unwrap();
    let mut handle = clients.network_interfaces().interface("abc", "5");
    let result = handle
        .set_static_ip(&iface, "10.0.0.50".parse().unwrap())
        .await;
    assert!(matches!(result, Err(MaasError::InvalidState(_))));
}

#[tokio::test]
async fn test_failed_relink_is_reported_after_unlink() {
    let (server, clients) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("/nodes/abc/interfaces/5/")))
        .and(body_string_contains("op=unlink_subnet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(api_path("/nodes/abc/interfaces/5/")))
        .and(body_string_contains("op=link_subnet"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("IP address is already in use."),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut handle = clients.network_interfaces().interface("abc", "5");
    let err = handle
        .update_ip_configuration(IpConfigurationUpdate {
            link_id: "77".to_string(),
            mode: LinkMode::Static,
            ip_address: Some("10.0.0.50".parse().unwrap()),
            subnet_id: Some(3),
        })
        .await
        .unwrap_err();
    assert_eq!(err.status(), Some(400));
}

#[tokio::test]
async fn test_set_dhcp_without_links_creates_link() {
    let (server, clients) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("/nodes/abc/interfaces/5/")))
        .and(body_string_contains("op=link_subnet"))
        .and(body_string_contains("mode=dhcp"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let iface: NetworkInterface = serde_json::from_value(json!({"id": 5, "name": "eth0"})).unwrap();
    let mut handle = clients.network_interfaces().interface("abc", "5");
    handle.set_dhcp(&iface, 3).await.unwrap();
}
