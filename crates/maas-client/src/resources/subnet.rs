//! Subnets (`/subnets/`) and the VLANs they sit on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;

const SUBNETS_API_PATH: &str = "/subnets/";

/// A VLAN on a fabric.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vlan {
    pub id: i64,
    pub vid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    pub fabric_id: i64,
    /// Fabric name.
    #[serde(rename = "fabric", deserialize_with = "null_as_default")]
    pub fabric_name: String,
    pub mtu: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub dhcp_on: bool,
}

/// A MAAS subnet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subnet {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub space: String,
    pub vlan: Option<Vlan>,
    #[serde(deserialize_with = "null_as_default")]
    pub cidr: String,
}

/// Subnets collection.
#[derive(Debug, Clone)]
pub struct Subnets {
    client: Arc<ApiClient>,
}

impl Subnets {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List all subnets. Useful to resolve a CIDR to a subnet id.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self) -> Result<Vec<Subnet>> {
        let envelope = self.client.get(SUBNETS_API_PATH, &Params::new()).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }
}
