//! Shared fixtures for the HTTP-level tests.

#![allow(dead_code)]

use maas_client::ClientSet;
use serde_json::{json, Value};
use wiremock::MockServer;

pub const API_KEY: &str = "ck:tk:ts";

/// Prefix every mock path needs; the client appends it to the endpoint.
pub const API: &str = "/api/2.0";

/// Start a mock MAAS and a client set pointed at it.
pub async fn setup() -> (MockServer, ClientSet) {
    let server = MockServer::start().await;
    let clients = ClientSet::new(&server.uri(), API_KEY).expect("failed to create client set");
    (server, clients)
}

pub fn api_path(path: &str) -> String {
    format!("{API}{path}")
}

pub fn machine_json(system_id: &str, boot_interface_id: i64, children: &[&str]) -> Value {
    json!({
        "system_id": system_id,
        "hostname": format!("{system_id}-host"),
        "fqdn": format!("{system_id}-host.maas"),
        "power_state": "off",
        "status_name": "Ready",
        "osystem": "",
        "distro_series": "",
        "swap_size": null,
        "memory": 16384,
        "storage": 500_107.86,
        "ip_addresses": ["10.0.0.21"],
        "zone": {"id": 1, "name": "default", "description": ""},
        "pool": {"id": 0, "name": "default", "description": ""},
        "tag_names": [],
        "boot_interface": {"id": boot_interface_id, "name": "eth0", "children": children}
    })
}
