//! Machine snapshot and its wire representation.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::resources::null_as_default;
use crate::resources::resource_pool::ResourcePool;
use crate::resources::zone::Zone;

/// How the boot interface is wired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BootInterfaceType {
    /// A plain NIC.
    Physical,
    /// An interface with children, assumed to be a bridge.
    Bridge,
}

impl fmt::Display for BootInterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Physical => write!(f, "physical"),
            Self::Bridge => write!(f, "bridge"),
        }
    }
}

/// Point-in-time view of a MAAS machine.
///
/// Serializes back to the MAAS wire shape, so a stored snapshot decodes to
/// the same value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "MachineResponse", into = "MachineResponse")]
pub struct Machine {
    pub system_id: String,
    pub fqdn: String,
    pub hostname: String,
    pub power_state: String,
    pub zone: Option<Zone>,
    pub pool: Option<ResourcePool>,
    /// Addresses that parsed; anything else MAAS reports is dropped.
    pub ip_addresses: Vec<IpAddr>,
    /// Lifecycle state, e.g. `Ready`, `Allocated`, `Deployed`.
    pub state: String,
    pub os_system: String,
    pub distro_series: String,
    pub swap_size: i64,
    /// Memory in MB.
    pub memory: i64,
    /// Total storage in MB.
    pub storage_mb: f64,
    pub boot_interface_id: Option<String>,
    pub boot_interface_type: Option<BootInterfaceType>,
    /// Names of the boot interface's children, e.g. a bridge on top of it.
    pub boot_interface_children: Vec<String>,
    pub tag_names: Vec<String>,
}

impl Machine {
    /// Total storage in decimal gigabytes.
    #[must_use]
    pub fn total_storage_gb(&self) -> f64 {
        if self.storage_mb <= 0.0 {
            0.0
        } else {
            self.storage_mb / 1000.0
        }
    }
}

/// Machine as returned by the MAAS API.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct MachineResponse {
    #[serde(deserialize_with = "null_as_default")]
    system_id: String,
    #[serde(deserialize_with = "null_as_default")]
    fqdn: String,
    #[serde(deserialize_with = "null_as_default")]
    hostname: String,
    #[serde(deserialize_with = "null_as_default")]
    power_state: String,
    zone: Option<Zone>,
    pool: Option<ResourcePool>,
    #[serde(deserialize_with = "null_as_default")]
    ip_addresses: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    status_name: String,
    #[serde(deserialize_with = "null_as_default")]
    osystem: String,
    #[serde(deserialize_with = "null_as_default")]
    distro_series: String,
    #[serde(deserialize_with = "null_as_default")]
    swap_size: i64,
    #[serde(deserialize_with = "null_as_default")]
    memory: i64,
    #[serde(deserialize_with = "null_as_default")]
    storage: f64,
    boot_interface: Option<BootInterfaceResponse>,
    #[serde(deserialize_with = "null_as_default")]
    tag_names: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct BootInterfaceResponse {
    #[serde(deserialize_with = "null_as_default")]
    id: i64,
    #[serde(deserialize_with = "null_as_default")]
    children: Vec<String>,
}

impl From<MachineResponse> for Machine {
    fn from(raw: MachineResponse) -> Self {
        let (boot_interface_id, boot_interface_type, boot_interface_children) =
            match raw.boot_interface {
                Some(iface) if iface.id != 0 => {
                    let kind = if iface.children.is_empty() {
                        BootInterfaceType::Physical
                    } else {
                        BootInterfaceType::Bridge
                    };
                    (Some(iface.id.to_string()), Some(kind), iface.children)
                }
                _ => (None, None, Vec::new()),
            };

        Self {
            system_id: raw.system_id,
            fqdn: raw.fqdn,
            hostname: raw.hostname,
            power_state: raw.power_state,
            zone: raw.zone,
            pool: raw.pool,
            ip_addresses: raw
                .ip_addresses
                .iter()
                .filter_map(|ip| ip.parse().ok())
                .collect(),
            state: raw.status_name,
            os_system: raw.osystem,
            distro_series: raw.distro_series,
            swap_size: raw.swap_size,
            memory: raw.memory,
            storage_mb: raw.storage,
            boot_interface_id,
            boot_interface_type,
            boot_interface_children,
            tag_names: raw.tag_names,
        }
    }
}

impl From<Machine> for MachineResponse {
    fn from(machine: Machine) -> Self {
        let boot_interface = machine.boot_interface_id.map(|id| BootInterfaceResponse {
            id: id.parse().unwrap_or_default(),
            children: machine.boot_interface_children,
        });

        Self {
            system_id: machine.system_id,
            fqdn: machine.fqdn,
            hostname: machine.hostname,
            power_state: machine.power_state,
            zone: machine.zone,
            pool: machine.pool,
            ip_addresses: machine
                .ip_addresses
                .iter()
                .map(ToString::to_string)
                .collect(),
            status_name: machine.state,
            osystem: machine.os_system,
            distro_series: machine.distro_series,
            swap_size: machine.swap_size,
            memory: machine.memory,
            storage: machine.storage_mb,
            boot_interface,
            tag_names: machine.tag_names,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MACHINE_JSON: &str = r#"{
        "system_id": "e7rdqc",
        "hostname": "node-1",
        "fqdn": "node-1.maas",
        "power_state": "on",
        "status_name": "Deployed",
        "osystem": "ubuntu",
        "distro_series": "focal",
        "swap_size": null,
        "memory": 8192,
        "storage": 250059.35,
        "ip_addresses": ["10.0.0.5", "fe80::1", "not-an-ip"],
        "zone": {"id": 1, "name": "default", "description": ""},
        "pool": {"id": 0, "name": "default", "description": "Default pool"},
        "tag_names": ["virtual"],
        "boot_interface": {"id": 12, "name": "eth0", "children": []}
    }"#;

    #[test]
    fn test_machine_from_api_response() {
        let machine: Machine = serde_json::from_str(MACHINE_JSON).unwrap();

        assert_eq!(machine.system_id, "e7rdqc");
        assert_eq!(machine.state, "Deployed");
        assert_eq!(machine.os_system, "ubuntu");
        assert_eq!(machine.swap_size, 0);
        assert_eq!(machine.zone.as_ref().unwrap().name, "default");
        assert_eq!(machine.pool.as_ref().unwrap().description, "Default pool");
        assert_eq!(machine.tag_names, ["virtual"]);
        assert_eq!(machine.boot_interface_id.as_deref(), Some("12"));
        assert_eq!(
            machine.boot_interface_type,
            Some(BootInterfaceType::Physical)
        );
    }

    #[test]
    fn test_unparsable_addresses_are_skipped() {
        let machine: Machine = serde_json::from_str(MACHINE_JSON).unwrap();
        let expected: Vec<IpAddr> = vec!["10.0.0.5".parse().unwrap(), "fe80::1".parse().unwrap()];
        assert_eq!(machine.ip_addresses, expected);
    }

    #[test]
    fn test_total_storage_gb_uses_decimal_units() {
        let machine: Machine = serde_json::from_str(MACHINE_JSON).unwrap();
        assert!((machine.total_storage_gb() - 250.059_35).abs() < 1e-9);

        let empty = Machine {
            storage_mb: -1.0,
            ..Machine::default()
        };
        assert!(empty.total_storage_gb().abs() < f64::EPSILON);
    }

    #[test]
    fn test_boot_interface_with_children_is_bridge() {
        let json = r#"{"system_id": "abc", "boot_interface": {"id": 3, "children": ["br0"]}}"#;
        let machine: Machine = serde_json::from_str(json).unwrap();
        assert_eq!(machine.boot_interface_type, Some(BootInterfaceType::Bridge));
        assert_eq!(machine.boot_interface_type.unwrap().to_string(), "bridge");
    }

    #[test]
    fn test_snapshot_survives_serde_round_trip() {
        let json = r#"{
            "system_id": "abc",
            "status_name": "Deployed",
            "osystem": "ubuntu",
            "storage": 2000.0,
            "ip_addresses": ["10.0.0.5"],
            "boot_interface": {"id": 3, "children": ["br0"]}
        }"#;
        let before: Machine = serde_json::from_str(json).unwrap();
        let stored = serde_json::to_string(&before).unwrap();
        let after: Machine = serde_json::from_str(&stored).unwrap();

        assert_eq!(after, before);
        assert_eq!(after.state, "Deployed");
        assert_eq!(after.os_system, "ubuntu");
        assert!((after.storage_mb - 2000.0).abs() < f64::EPSILON);
        assert_eq!(after.boot_interface_id.as_deref(), Some("3"));
        assert_eq!(after.boot_interface_type, Some(BootInterfaceType::Bridge));
        assert_eq!(after.boot_interface_children, ["br0"]);
    }

    #[test]
    fn test_zero_boot_interface_id_is_absent() {
        let json = r#"{"system_id": "abc", "boot_interface": {"id": 0, "children": ["br0"]}}"#;
        let machine: Machine = serde_json::from_str(json).unwrap();
        assert_eq!(machine.boot_interface_id, None);
        assert_eq!(machine.boot_interface_type, None);
    }
}
