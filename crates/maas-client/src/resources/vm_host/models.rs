//! VM host snapshot and its wire representation.

use serde::{Deserialize, Serialize};

use crate::resources::{id_as_string, null_as_default};
use crate::resources::resource_pool::ResourcePool;
use crate::resources::zone::Zone;

/// Cores and memory (MB) of a host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VmHostResources {
    pub cores: i64,
    pub memory: i64,
}

/// One storage pool of a host. Sizes are in bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoragePool {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub driver: String,
    pub total: i64,
    pub used: i64,
    pub pending: i64,
    #[serde(rename = "avail")]
    pub available: i64,
    pub remote: bool,
}

/// Point-in-time view of a VM host. Serializes to the MAAS wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VmHostResponse", into = "VmHostResponse")]
pub struct VmHost {
    /// Numeric MAAS id in string form.
    pub id: String,
    pub name: String,
    /// `lxd` or `virsh`.
    pub host_type: String,
    pub power_address: String,
    pub zone: Option<Zone>,
    pub pool: Option<ResourcePool>,
    pub total: VmHostResources,
    pub used: VmHostResources,
    pub available: VmHostResources,
    pub capabilities: Vec<String>,
    pub projects: Vec<String>,
    pub storage_pools: Vec<StoragePool>,
}

/// VM host as returned by the MAAS API.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct VmHostResponse {
    id: i64,
    #[serde(deserialize_with = "null_as_default")]
    name: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    host_type: String,
    #[serde(deserialize_with = "null_as_default")]
    power_address: String,
    #[serde(deserialize_with = "null_as_default")]
    zone: Zone,
    #[serde(deserialize_with = "null_as_default")]
    pool: ResourcePool,
    #[serde(deserialize_with = "null_as_default")]
    total: VmHostResources,
    #[serde(deserialize_with = "null_as_default")]
    used: VmHostResources,
    #[serde(deserialize_with = "null_as_default")]
    available: VmHostResources,
    #[serde(deserialize_with = "null_as_default")]
    capabilities: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    projects: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    storage_pools: Vec<StoragePool>,
}

impl From<VmHostResponse> for VmHost {
    fn from(raw: VmHostResponse) -> Self {
        let zone = (!raw.zone.name.is_empty() && raw.zone.id != 0).then_some(raw.zone);
        let pool = (!raw.pool.name.is_empty() && raw.pool.id > 0).then_some(raw.pool);

        Self {
            id: raw.id.to_string(),
            name: raw.name,
            host_type: raw.host_type,
            power_address: raw.power_address,
            zone,
            pool,
            total: raw.total,
            used: raw.used,
            available: raw.available,
            capabilities: raw.capabilities,
            projects: raw.projects,
            storage_pools: raw.storage_pools,
        }
    }
}

impl From<VmHost> for VmHostResponse {
    fn from(host: VmHost) -> Self {
        Self {
            id: host.id.parse().unwrap_or_default(),
            name: host.name,
            host_type: host.host_type,
            power_address: host.power_address,
            zone: host.zone.unwrap_or_default(),
            pool: host.pool.unwrap_or_default(),
            total: host.total,
            used: host.used,
            available: host.available,
            capabilities: host.capabilities,
            projects: host.projects,
            storage_pools: host.storage_pools,
        }
    }
}
