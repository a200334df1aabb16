//! Network interface snapshot types.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

use crate::error::{MaasError, Result};
use crate::resources::subnet::{Subnet, Vlan};
use crate::resources::{id_as_string, lenient_ip, null_as_default};

/// How an interface link obtains its address.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    Auto,
    Dhcp,
    Static,
    LinkUp,
    #[default]
    #[serde(other)]
    Unknown,
}

impl LinkMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Dhcp => "dhcp",
            Self::Static => "static",
            Self::LinkUp => "link_up",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A link between an interface and a subnet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InterfaceLink {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub mode: LinkMode,
    pub subnet: Option<Subnet>,
    #[serde(deserialize_with = "lenient_ip")]
    pub ip_address: Option<IpAddr>,
}

/// Point-in-time view of a machine interface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkInterface {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// `physical`, `bridge`, `bond`, `vlan`, ...
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub interface_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub enabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub mac_address: String,
    #[serde(deserialize_with = "null_as_default")]
    pub links: Vec<InterfaceLink>,
    /// Names of interfaces stacked on this one.
    #[serde(deserialize_with = "null_as_default")]
    pub children: Vec<String>,
    pub vlan: Option<Vlan>,
}

/// Replacement configuration for an existing link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpConfigurationUpdate {
    pub link_id: String,
    pub mode: LinkMode,
    /// Required when `mode` is [`LinkMode::Static`].
    pub ip_address: Option<IpAddr>,
    pub subnet_id: Option<i64>,
}

impl IpConfigurationUpdate {
    /// Check required fields before any request is sent.
    ///
    /// # Errors
    /// Returns [`MaasError::InvalidState`] naming the first missing field.
    pub fn validate(&self) -> Result<()> {
        if self.link_id.is_empty() {
            return Err(MaasError::InvalidState("link id is required".to_string()));
        }
        if self.mode == LinkMode::Unknown {
            return Err(MaasError::InvalidState("link mode is required".to_string()));
        }
        if self.subnet_id.is_none() {
            return Err(MaasError::InvalidState("subnet id is required".to_string()));
        }
        if self.mode == LinkMode::Static && self.ip_address.is_none() {
            return Err(MaasError::InvalidState(
                "ip address is required for static mode".to_string(),
            ));
        }
        Ok(())
    }
}
