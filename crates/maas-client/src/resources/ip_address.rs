//! Reserved and assigned IP addresses (`/ipaddresses/`).

use std::net::IpAddr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::keys::{ALL, FORCE, IP, OPERATION, OP_RELEASE, TRUE};
use super::network_interface::NetworkInterface;
use super::{lenient_ip, null_as_default};
use crate::client::ApiClient;
use crate::error::{MaasError, Result};
use crate::params::Params;

const IP_ADDRESSES_API_PATH: &str = "/ipaddresses/";

/// An IP address and the interfaces it is bound to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IpAddress {
    #[serde(deserialize_with = "lenient_ip")]
    pub ip: Option<IpAddr>,
    #[serde(deserialize_with = "null_as_default")]
    pub interface_set: Vec<NetworkInterface>,
}

#[derive(Debug, Clone)]
pub struct IpAddresses {
    client: Arc<ApiClient>,
}

impl IpAddresses {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List addresses owned by the caller, optionally filtered.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self, filter: Option<&Params>) -> Result<Vec<IpAddress>> {
        let mut query = Params::new();
        if let Some(filter) = filter {
            query.copy(filter);
        }
        self.query(&query).await
    }

    /// Look up one address owned by the caller.
    ///
    /// # Errors
    /// Returns [`MaasError::NotFound`] if MAAS reports no such address.
    pub async fn get(&self, ip: &str) -> Result<IpAddress> {
        let query = Params::new().with(IP, ip);
        self.first(ip, &query).await
    }

    /// Look up one address regardless of owner. Admin only.
    ///
    /// # Errors
    /// Returns [`MaasError::NotFound`] if MAAS reports no such address.
    pub async fn get_all(&self, ip: &str) -> Result<IpAddress> {
        let query = Params::new().with(IP, ip).with(ALL, TRUE);
        self.first(ip, &query).await
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects the release.
    pub async fn release(&self, ip: &str) -> Result<()> {
        info!(ip, "Releasing IP address");
        let params = Params::new().with(OPERATION, OP_RELEASE).with(IP, ip);
        self.client
            .post(IP_ADDRESSES_API_PATH, &params)
            .await?
            .ensure_success()
    }

    /// Release an address even if another user holds it. Admin only.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects the release.
    pub async fn force_release(&self, ip: &str) -> Result<()> {
        info!(ip, "Force releasing IP address");
        let params = Params::new()
            .with(OPERATION, OP_RELEASE)
            .with(IP, ip)
            .with(FORCE, TRUE);
        self.client
            .post(IP_ADDRESSES_API_PATH, &params)
            .await?
            .ensure_success()
    }

    async fn query(&self, query: &Params) -> Result<Vec<IpAddress>> {
        let envelope = self.client.get(IP_ADDRESSES_API_PATH, query).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    async fn first(&self, ip: &str, query: &Params) -> Result<IpAddress> {
        self.query(query)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| MaasError::NotFound(format!("no IP address found for {ip}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ip_address_with_interfaces() {
        let json = r#"{
            "ip": "10.0.0.9",
            "alloc_type_name": "Sticky",
            "interface_set": [{"id": 12, "name": "eth0", "links": []}]
        }"#;
        let address: IpAddress = serde_json::from_str(json).unwrap();
        assert_eq!(address.ip, Some("10.0.0.9".parse().unwrap()));
        assert_eq!(address.interface_set[0].name, "eth0");
    }
}
