//! Machine lifecycle calls against a mock MAAS.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use maas_client::resources::BootInterfaceType;
use maas_client::Params;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use common::{api_path, machine_json, setup};

#[tokio::test]
async fn test_list_applies_filter() {
    let (server, clients) = setup().await;

    Mock::given(method("GET"))
        .and(path(api_path("/machines/")))
        .and(query_param("hostname", "abc-host"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([machine_json("abc", 5, &[])])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let filter = Params::new().with("hostname", "abc-host");
    let machines = clients.machines().list(Some(&filter)).await.unwrap();

    assert_eq!(machines.len(), 1);
    let machine = &machines[0];
    assert_eq!(machine.system_id, "abc");
    assert_eq!(machine.state, "Ready");
    assert_eq!(machine.ip_addresses[0].to_string(), "10.0.0.21");
    assert!((machine.total_storage_gb() - 500.107_86).abs() < 1e-9);
    assert_eq!(machine.boot_interface_type, Some(BootInterfaceType::Physical));
}

#[tokio::test]
async fn test_allocate_sends_constraints() {
    let (server, clients) = setup().await;

    Mock::given(method("POST"))
        .and(path(api_path("/machines/")))
        .and(body_string_contains("op=allocate"))
        .and(body_string_contains("zone=az1"))
        .and(body_string_contains("tags=gpu&tags=nvme"))
        .and(body_string_contains("not_pod=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine_json("abc", 5, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let mut machines = clients.machines();
    let machine = machines
        .allocator()
        .with_zone("az1")
        .with_tags(["gpu", "nvme"])
        .with_not_pod()
        .allocate()
        .await
        .unwrap();
    assert_eq!(machine.system_id, "abc");
}

#[tokio::test]
async fn test_deploy_and_release() {
    let (server, clients) = setup().await;

    let mut deployed = machine_json("abc", 5, &["br0"]);
    deployed["status_name"] = json!("Deploying");
    deployed["osystem"] = json!("ubuntu");
    deployed["distro_series"] = json!("jammy");

    Mock::given(method("POST"))
        .and(path(api_path("/machines/abc/")))
        .and(body_string_contains("op=deploy"))
        .and(body_string_contains("osystem=ubuntu"))
        .and(body_string_contains("distro_series=jammy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(deployed))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(api_path("/machines/abc/")))
        .and(body_string_contains("op=release"))
        .and(body_string_contains("quick_erase=true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(machine_json("abc", 5, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let mut handle = clients.machines().machine("abc");
    let machine = handle
        .deployer()
        .set_os_system("ubuntu")
        .set_distro_series("jammy")
        .deploy()
        .await
        .unwrap();
    assert_eq!(machine.state, "Deploying");
    assert_eq!(machine.boot_interface_type, Some(BootInterfaceType::Bridge));

    let machine = handle.releaser().with_quick_erase().release().await.unwrap();
    assert_eq!(machine.state, "Ready");
}

#[tokio::test]
async fn test_power_on_uses_operation_parameter() {
    let (server, clients) = setup().await;

    let mut powered = machine_json("abc", 5, &[]);
    powered["power_state"] = json!("on");

    Mock::given(method("POST"))
        .and(path(api_path("/machines/abc/")))
        .and(body_string_contains("op=power_on"))
        .and(body_string_contains("comment=rack+4"))
        .respond_with(ResponseTemplate::new(200).set_body_json(powered))
        .expect(1)
        .mount(&server)
        .await;

    let mut handle = clients.machines().machine("abc");
    let machine = handle
        .power_on()
        .with_comment("rack 4")
        .power_on()
        .await
        .unwrap();
    assert_eq!(machine.power_state, "on");
}

#[tokio::test]
async fn test_modifier_puts_params() {
    let (server, clients) = setup().await;

    let mut renamed = machine_json("abc", 5, &[]);
    renamed["hostname"] = json!("node-9");

    Mock::given(method("PUT"))
        .and(path(api_path("/machines/abc/")))
        .and(body_string_contains("hostname=node-9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(renamed))
        .expect(1)
        .mount(&server)
        .await;

    let mut handle = clients.machines().machine("abc");
    let machine = handle
        .modifier()
        .set_hostname("node-9")
        .update()
        .await
        .unwrap();
    assert_eq!(machine.hostname, "node-9");
}

#[tokio::test]
async fn test_delete_accepts_no_content() {
    let (server, clients) = setup().await;

    Mock::given(method("DELETE"))
        .and(path(api_path("/machines/abc/")))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    clients.machines().machine("abc").delete().await.unwrap();
}
