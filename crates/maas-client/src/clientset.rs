//! Entry point bundling every resource controller.

use std::sync::Arc;

use reqwest::Client;
use tracing::info;

use crate::auth::Credential;
use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::resources::{
    BootResources, DnsResources, IpAddresses, Machines, NetworkInterfaces, RackControllers,
    ResourcePools, Spaces, Subnets, Tags, User, Users, VmHosts, Zones,
};

/// One signed transport shared by all resource controllers.
///
/// Controllers are cheap to create; each accessor returns a fresh one with
/// its own staged parameters.
#[derive(Debug, Clone)]
pub struct ClientSet {
    client: Arc<ApiClient>,
}

impl ClientSet {
    /// Create a client set for `endpoint` (e.g. `http://maas:5240/MAAS`).
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created.
    pub fn new(endpoint: &str, api_key: impl Into<String>) -> Result<Self> {
        Ok(Self::from_client(ApiClient::new(endpoint, api_key)?))
    }

    /// # Errors
    /// Returns error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Ok(Self::from_client(ApiClient::from_config(config)?))
    }

    /// Use a preconfigured `reqwest` client (proxies, custom TLS, ...).
    #[must_use]
    pub fn with_http_client(endpoint: &str, api_key: impl Into<String>, http: Client) -> Self {
        Self::from_client(ApiClient::with_http_client(endpoint, api_key, http))
    }

    fn from_client(client: ApiClient) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    /// The shared transport.
    #[must_use]
    pub fn api_client(&self) -> &ApiClient {
        &self.client
    }

    /// Check the API key and return the user it belongs to.
    ///
    /// # Errors
    /// Returns [`crate::MaasError::Config`] before any request if the key is
    /// not a three-part credential, or [`crate::MaasError::Api`] if MAAS
    /// rejects it.
    pub async fn authenticate(&self) -> Result<User> {
        self.client.api_key().parse::<Credential>()?;
        let user = self.users().whoami().await?;
        info!(username = %user.username, endpoint = %self.client.base_url(), "Authenticated");
        Ok(user)
    }

    #[must_use]
    pub fn boot_resources(&self) -> BootResources {
        BootResources::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn dns_resources(&self) -> DnsResources {
        DnsResources::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn ip_addresses(&self) -> IpAddresses {
        IpAddresses::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn machines(&self) -> Machines {
        Machines::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn network_interfaces(&self) -> NetworkInterfaces {
        NetworkInterfaces::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn rack_controllers(&self) -> RackControllers {
        RackControllers::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn resource_pools(&self) -> ResourcePools {
        ResourcePools::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn spaces(&self) -> Spaces {
        Spaces::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn subnets(&self) -> Subnets {
        Subnets::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn tags(&self) -> Tags {
        Tags::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn users(&self) -> Users {
        Users::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn vm_hosts(&self) -> VmHosts {
        VmHosts::new(Arc::clone(&self.client))
    }

    #[must_use]
    pub fn zones(&self) -> Zones {
        Zones::new(Arc::clone(&self.client))
    }
}
