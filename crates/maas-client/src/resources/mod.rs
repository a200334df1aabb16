//! Resource controllers for the MAAS API.
//!
//! Each resource has a collection type (list, builders, handle lookup) and,
//! where MAAS exposes per-object endpoints, a handle type whose fluent chains
//! stage parameters and finish with a single network call. Every call returns
//! a fresh snapshot; handles never cache server state.

pub mod boot_resource;
pub mod dns;
pub mod ip_address;
pub mod machine;
pub mod network_interface;
pub mod rack_controller;
pub mod resource_pool;
pub mod space;
pub mod subnet;
pub mod tag;
pub mod user;
pub mod vm_host;
pub mod zone;

pub use boot_resource::{
    BootResource, BootResourceBuilder, BootResourceFile, BootResourceHandle, BootResourceSet,
    BootResources, UPLOAD_CHUNK_SIZE,
};
pub use dns::{DnsResource, DnsResourceBuilder, DnsResourceHandle, DnsResourceModifier, DnsResources};
pub use ip_address::{IpAddress, IpAddresses};
pub use machine::{
    BootInterfaceType, Machine, MachineAllocator, MachineDeployer, MachineHandle,
    MachineModifier, MachinePowerOn, MachineReleaser, Machines,
};
pub use network_interface::{
    InterfaceHandle, InterfaceLink, IpConfigurationUpdate, LinkMode, NetworkInterface,
    NetworkInterfaces,
};
pub use rack_controller::RackControllers;
pub use resource_pool::{ResourcePool, ResourcePools};
pub use space::{Space, Spaces};
pub use subnet::{Subnet, Subnets, Vlan};
pub use tag::{Tag, Tags};
pub use user::{User, Users};
pub use vm_host::{StoragePool, VmComposer, VmHost, VmHostHandle, VmHostResources, VmHosts};
pub use zone::{Zone, Zones};

use std::net::IpAddr;

use serde::{Deserialize, Deserializer};

/// Parameter keys and `op` values understood by MAAS.
pub(crate) mod keys {
    pub const OPERATION: &str = "op";

    pub const FQDN: &str = "fqdn";
    pub const DOMAIN: &str = "domain";
    pub const NAME: &str = "name";
    pub const ARCHITECTURE: &str = "architecture";
    pub const SHA256: &str = "sha256";
    pub const SIZE: &str = "size";
    pub const ZONE: &str = "zone";
    pub const TAGS: &str = "tags";
    pub const SYSTEM_ID: &str = "system_id";
    pub const CPU_COUNT: &str = "cpu_count";
    pub const MEMORY: &str = "mem";
    pub const POOL: &str = "pool";
    pub const NOT_POD: &str = "not_pod";
    pub const OS_SYSTEM: &str = "osystem";
    pub const USER_DATA: &str = "user_data";
    pub const DISTRO_SERIES: &str = "distro_series";
    pub const TITLE: &str = "title";
    pub const FILE_TYPE: &str = "filetype";
    pub const ALL: &str = "all";
    pub const ADDRESS_TTL: &str = "address_ttl";
    pub const IP_ADDRESSES: &str = "ip_addresses";
    pub const ID: &str = "id";
    pub const IP: &str = "ip";
    pub const ERASE: &str = "erase";
    pub const QUICK_ERASE: &str = "quick_erase";
    pub const SECURE_ERASE: &str = "secure_erase";
    pub const FORCE: &str = "force";
    pub const COMMENT: &str = "comment";
    pub const SWAP_SIZE: &str = "swap_size";
    pub const HOSTNAME: &str = "hostname";
    pub const SUBNET: &str = "subnet";
    pub const IP_ADDRESS: &str = "ip_address";
    pub const MODE: &str = "mode";
    pub const MACHINES: &str = "machines";
    pub const CORES: &str = "cores";
    pub const STORAGE: &str = "storage";
    pub const TRUE: &str = "true";

    pub const OP_DEPLOY: &str = "deploy";
    pub const OP_WHOAMI: &str = "whoami";
    pub const OP_IMPORT_BOOT_IMAGES: &str = "import_boot_images";
    pub const OP_RELEASE: &str = "release";
    pub const OP_ALLOCATE: &str = "allocate";
    pub const OP_POWER_ON: &str = "power_on";
    pub const OP_LINK_SUBNET: &str = "link_subnet";
    pub const OP_UNLINK_SUBNET: &str = "unlink_subnet";
    pub const OP_COMPOSE: &str = "compose";
    pub const OP_ASSIGN: &str = "assign";
    pub const OP_REMOVE: &str = "remove";
}

/// Treat an explicit JSON `null` like a missing field.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Empty or malformed addresses decode as `None`.
pub(crate) fn lenient_ip<'de, D>(deserializer: D) -> Result<Option<IpAddr>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.and_then(|raw| raw.parse().ok()))
}

/// Ids that MAAS sends as numbers but fixtures sometimes send as strings.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(i64),
    Text(String),
}

/// Decode a numeric-or-string id into its string form.
pub(crate) fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawId>::deserialize(deserializer)? {
        Some(RawId::Number(id)) => id.to_string(),
        Some(RawId::Text(id)) => id,
        None => String::new(),
    })
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default, deserialize_with = "id_as_string")]
        id: String,
    }

    #[test]
    fn test_null_and_missing_fields_default() {
        let sample: Sample = serde_json::from_str(r#"{"name": null}"#).unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.id, "");
    }

    #[test]
    fn test_id_accepts_number_or_string() {
        let numeric: Sample = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        let text: Sample = serde_json::from_str(r#"{"id": "link-1"}"#).unwrap();
        assert_eq!(numeric.id, "42");
        assert_eq!(text.id, "link-1");
    }

    #[test]
    fn test_type_mismatch_still_fails() {
        let result: Result<Sample, _> = serde_json::from_str(r#"{"name": 5}"#);
        assert!(result.is_err());
    }
}
