//! VM host collection, handle, and machine composition.

use std::sync::Arc;

use tracing::info;

use super::models::VmHost;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;
use crate::resources::keys::{CORES, HOSTNAME, MEMORY, OPERATION, OP_COMPOSE, POOL, STORAGE, ZONE};
use crate::resources::machine::{Machine, MachineHandle};

const VM_HOSTS_API_PATH: &str = "/vm-hosts/";

/// VM hosts collection.
#[derive(Debug, Clone)]
pub struct VmHosts {
    client: Arc<ApiClient>,
}

impl VmHosts {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self, filter: Option<&Params>) -> Result<Vec<VmHost>> {
        let mut query = Params::new();
        if let Some(filter) = filter {
            query.copy(filter);
        }
        let envelope = self.client.get(VM_HOSTS_API_PATH, &query).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    /// Register a VM host. `params` carries `type`, `power_address` and
    /// whatever else the host type needs.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects the host.
    pub async fn create(&self, params: &Params) -> Result<VmHost> {
        info!(power_address = ?params.get("power_address"), "Creating VM host");
        self.client
            .post(VM_HOSTS_API_PATH, params)
            .await?
            .into_value()
    }

    /// Handle for one VM host. No request is made.
    #[must_use]
    pub fn vm_host(&self, id: &str) -> VmHostHandle {
        VmHostHandle {
            client: Arc::clone(&self.client),
            id: id.to_string(),
            api_path: format!("{VM_HOSTS_API_PATH}{id}/"),
            params: Params::new(),
        }
    }
}

/// One VM host, addressed by id.
#[derive(Debug, Clone)]
pub struct VmHostHandle {
    client: Arc<ApiClient>,
    id: String,
    api_path: String,
    params: Params,
}

impl VmHostHandle {
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn get(&self) -> Result<VmHost> {
        self.client
            .get(&self.api_path, &Params::new())
            .await?
            .into_value()
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects the update.
    pub async fn update(&self, params: &Params) -> Result<VmHost> {
        info!(id = %self.id, "Updating VM host");
        self.client
            .put_params(&self.api_path, params)
            .await?
            .into_value()
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects it.
    pub async fn delete(&self) -> Result<()> {
        info!(id = %self.id, "Deleting VM host");
        self.client
            .delete(&self.api_path, &Params::new())
            .await?
            .ensure_success()
    }

    /// Machines composed on this host.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn machines(&self) -> Result<Vec<Machine>> {
        let path = format!("{}machines/", self.api_path);
        let envelope = self.client.get(&path, &Params::new()).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    pub fn composer(&mut self) -> VmComposer<'_> {
        self.params.reset();
        self.params.set(OPERATION, OP_COMPOSE);
        VmComposer { host: self }
    }
}

/// Pending `op=compose` request.
#[derive(Debug)]
pub struct VmComposer<'a> {
    host: &'a mut VmHostHandle,
}

impl VmComposer<'_> {
    #[must_use]
    pub fn with_cores(mut self, cores: u32) -> Self {
        self.host.params.set(CORES, cores.to_string());
        self
    }

    /// Memory in MB.
    #[must_use]
    pub fn with_memory(mut self, memory_mb: u64) -> Self {
        self.host.params.set(MEMORY, memory_mb.to_string());
        self
    }

    #[must_use]
    pub fn with_hostname(mut self, hostname: &str) -> Self {
        self.host.params.set(HOSTNAME, hostname);
        self
    }

    /// Disk layout, e.g. `root:32(default)`.
    #[must_use]
    pub fn with_storage(mut self, storage: &str) -> Self {
        self.host.params.set(STORAGE, storage);
        self
    }

    #[must_use]
    pub fn with_zone(mut self, zone: &str) -> Self {
        self.host.params.set(ZONE, zone);
        self
    }

    #[must_use]
    pub fn with_pool(mut self, pool: &str) -> Self {
        self.host.params.set(POOL, pool);
        self
    }

    /// Any other compose parameter.
    #[must_use]
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.host.params.set(key, value);
        self
    }

    /// Compose a machine and return a handle to it.
    ///
    /// # Errors
    /// Returns error if the request fails or the host lacks capacity.
    pub async fn compose(self) -> Result<MachineHandle> {
        info!(id = %self.host.id, hostname = ?self.host.params.get(HOSTNAME), "Composing machine");
        let machine: Machine = self
            .host
            .client
            .post(&self.host.api_path, &self.host.params)
            .await?
            .into_value()?;
        Ok(MachineHandle::new(
            Arc::clone(&self.host.client),
            machine.system_id,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_composer_stages_operation_in_params() {
        let client = Arc::new(ApiClient::new("http://maas.local/MAAS", "ck:tk:ts").unwrap());
        let mut host = VmHosts::new(client).vm_host("3");
        let _ = host
            .composer()
            .with_cores(2)
            .with_memory(4096)
            .with_param("architecture", "amd64/generic");

        assert_eq!(host.api_path, "/vm-hosts/3/");
        assert_eq!(host.params.get(OPERATION), Some(OP_COMPOSE));
        assert_eq!(host.params.get(CORES), Some("2"));
        assert_eq!(host.params.get("architecture"), Some("amd64/generic"));
    }
}
