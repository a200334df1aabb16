//! DNS resources (`/dnsresources/`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use super::ip_address::IpAddress;
use super::keys::{ADDRESS_TTL, ALL, DOMAIN, FQDN, ID, IP_ADDRESSES, NAME, TRUE};
use super::null_as_default;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;

const DNS_RESOURCES_API_PATH: &str = "/dnsresources/";

/// Point-in-time view of a DNS resource.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DnsResource {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub fqdn: String,
    /// `None` when the domain default TTL applies.
    pub address_ttl: Option<u32>,
    #[serde(deserialize_with = "null_as_default")]
    pub ip_addresses: Vec<IpAddress>,
}

/// DNS resources collection.
#[derive(Debug, Clone)]
pub struct DnsResources {
    client: Arc<ApiClient>,
    params: Params,
}

impl DnsResources {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            params: Params::new(),
        }
    }

    /// List DNS resources. Without a filter every resource is returned,
    /// including those MAAS creates implicitly (`all=true`).
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self, filter: Option<&Params>) -> Result<Vec<DnsResource>> {
        let query = match filter {
            Some(filter) => filter.clone(),
            None => Params::new().with(ALL, TRUE),
        };
        let envelope = self.client.get(DNS_RESOURCES_API_PATH, &query).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    /// Handle for one DNS resource. No request is made.
    #[must_use]
    pub fn dns_resource(&self, id: i64) -> DnsResourceHandle {
        DnsResourceHandle {
            client: Arc::clone(&self.client),
            id,
            api_path: format!("{DNS_RESOURCES_API_PATH}{id}/"),
            params: Params::new(),
        }
    }

    pub fn builder(&mut self) -> DnsResourceBuilder<'_> {
        self.params.reset();
        DnsResourceBuilder { resources: self }
    }
}

/// Pending DNS resource creation.
#[derive(Debug)]
pub struct DnsResourceBuilder<'a> {
    resources: &'a mut DnsResources,
}

impl DnsResourceBuilder<'_> {
    #[must_use]
    pub fn with_fqdn(mut self, fqdn: &str) -> Self {
        self.resources.params.add(FQDN, fqdn);
        self
    }

    #[must_use]
    pub fn with_domain(mut self, domain: &str) -> Self {
        self.resources.params.set(DOMAIN, domain);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.resources.params.set(NAME, name);
        self
    }

    #[must_use]
    pub fn with_address_ttl(mut self, ttl: u32) -> Self {
        self.resources.params.add(ADDRESS_TTL, ttl.to_string());
        self
    }

    /// Addresses are sent space separated in one value.
    #[must_use]
    pub fn with_ip_addresses(mut self, addresses: &[&str]) -> Self {
        self.resources.params.add(IP_ADDRESSES, addresses.join(" "));
        self
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects the resource.
    pub async fn create(self) -> Result<DnsResource> {
        info!(fqdn = ?self.resources.params.get(FQDN), "Creating DNS resource");
        self.resources
            .client
            .post(DNS_RESOURCES_API_PATH, &self.resources.params)
            .await?
            .into_value()
    }
}

/// One DNS resource, addressed by id.
#[derive(Debug, Clone)]
pub struct DnsResourceHandle {
    client: Arc<ApiClient>,
    id: i64,
    api_path: String,
    params: Params,
}

impl DnsResourceHandle {
    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn get(&self) -> Result<DnsResource> {
        self.client
            .get(&self.api_path, &Params::new())
            .await?
            .into_value()
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects it.
    pub async fn delete(&self) -> Result<()> {
        info!(id = self.id, "Deleting DNS resource");
        self.client
            .delete(&self.api_path, &Params::new())
            .await?
            .ensure_success()
    }

    pub fn modifier(&mut self) -> DnsResourceModifier<'_> {
        self.params.reset();
        DnsResourceModifier { handle: self }
    }
}

/// Attribute updates for one DNS resource.
#[derive(Debug)]
pub struct DnsResourceModifier<'a> {
    handle: &'a mut DnsResourceHandle,
}

impl DnsResourceModifier<'_> {
    #[must_use]
    pub fn set_fqdn(mut self, fqdn: &str) -> Self {
        self.handle.params.set(FQDN, fqdn);
        self
    }

    #[must_use]
    pub fn set_address_ttl(mut self, ttl: u32) -> Self {
        self.handle.params.set(ADDRESS_TTL, ttl.to_string());
        self
    }

    #[must_use]
    pub fn set_ip_addresses(mut self, addresses: &[&str]) -> Self {
        self.handle.params.set(IP_ADDRESSES, addresses.join(" "));
        self
    }

    #[must_use]
    pub fn set_name(mut self, name: &str) -> Self {
        self.handle.params.set(NAME, name);
        self
    }

    #[must_use]
    pub fn set_domain(mut self, domain: &str) -> Self {
        self.handle.params.set(DOMAIN, domain);
        self
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects the update.
    pub async fn modify(mut self) -> Result<DnsResource> {
        self.handle.params.set(ID, self.handle.id.to_string());
        info!(id = self.handle.id, "Updating DNS resource");
        self.handle
            .client
            .put_params(&self.handle.api_path, &self.handle.params)
            .await?
            .into_value()
    }
}
