//! Machine collection, handle, and their fluent operations.

use std::sync::Arc;

use tracing::info;

use super::models::Machine;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;
use crate::resources::keys::{
    COMMENT, CPU_COUNT, DISTRO_SERIES, ERASE, FORCE, HOSTNAME, MEMORY, NAME, NOT_POD, OPERATION,
    OP_ALLOCATE, OP_DEPLOY, OP_POWER_ON, OP_RELEASE, OS_SYSTEM, POOL, QUICK_ERASE, SECURE_ERASE,
    SWAP_SIZE, SYSTEM_ID, TAGS, TRUE, USER_DATA, ZONE,
};

const MACHINES_API_PATH: &str = "/machines/";

/// Machines collection.
#[derive(Debug, Clone)]
pub struct Machines {
    client: Arc<ApiClient>,
    params: Params,
}

impl Machines {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            params: Params::new(),
        }
    }

    /// List machines, optionally filtered (e.g. by `hostname` or `zone`).
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self, filter: Option<&Params>) -> Result<Vec<Machine>> {
        let mut query = Params::new();
        if let Some(filter) = filter {
            query.copy(filter);
        }
        let envelope = self.client.get(MACHINES_API_PATH, &query).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    /// Handle for one machine. No request is made.
    #[must_use]
    pub fn machine(&self, system_id: impl Into<String>) -> MachineHandle {
        MachineHandle::new(Arc::clone(&self.client), system_id)
    }

    /// Start an allocation request.
    pub fn allocator(&mut self) -> MachineAllocator<'_> {
        self.params.reset();
        self.params.set(OPERATION, OP_ALLOCATE);
        MachineAllocator { machines: self }
    }
}

/// Constraints for `op=allocate`.
#[derive(Debug)]
pub struct MachineAllocator<'a> {
    machines: &'a mut Machines,
}

impl MachineAllocator<'_> {
    #[must_use]
    pub fn with_zone(mut self, zone: &str) -> Self {
        self.machines.params.set(ZONE, zone);
        self
    }

    #[must_use]
    pub fn with_system_id(mut self, system_id: &str) -> Self {
        self.machines.params.set(SYSTEM_ID, system_id);
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.machines.params.set(NAME, name);
        self
    }

    #[must_use]
    pub fn with_cpu_count(mut self, cpu_count: u32) -> Self {
        self.machines.params.set(CPU_COUNT, cpu_count.to_string());
        self
    }

    /// Minimum memory in MB.
    #[must_use]
    pub fn with_memory(mut self, memory_mb: u64) -> Self {
        self.machines.params.set(MEMORY, memory_mb.to_string());
        self
    }

    /// Require every tag; each becomes its own `tags` value.
    #[must_use]
    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for tag in tags {
            self.machines.params.add(TAGS, tag);
        }
        self
    }

    #[must_use]
    pub fn with_resource_pool(mut self, pool: &str) -> Self {
        self.machines.params.set(POOL, pool);
        self
    }

    /// Exclude machines composed from VM hosts.
    #[must_use]
    pub fn with_not_pod(mut self) -> Self {
        self.machines.params.set(NOT_POD, TRUE);
        self
    }

    /// Allocate a machine matching the staged constraints.
    ///
    /// # Errors
    /// Returns error if no machine matches (MAAS answers 409) or the request
    /// fails.
    pub async fn allocate(self) -> Result<Machine> {
        info!(params = %self.machines.params.to_form(), "Allocating machine");
        self.machines
            .client
            .post(MACHINES_API_PATH, &self.machines.params)
            .await?
            .into_value()
    }
}

/// One machine, addressed by system id.
#[derive(Debug, Clone)]
pub struct MachineHandle {
    client: Arc<ApiClient>,
    system_id: String,
    api_path: String,
    params: Params,
}

impl MachineHandle {
    pub(crate) fn new(client: Arc<ApiClient>, system_id: impl Into<String>) -> Self {
        let system_id = system_id.into();
        let api_path = format!("{MACHINES_API_PATH}{system_id}/");
        Self {
            client,
            system_id,
            api_path,
            params: Params::new(),
        }
    }

    #[must_use]
    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    /// Fetch the current state of the machine.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn get(&self) -> Result<Machine> {
        self.client
            .get(&self.api_path, &Params::new())
            .await?
            .into_value()
    }

    /// Delete the machine from MAAS.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects it.
    pub async fn delete(&self) -> Result<()> {
        info!(system_id = %self.system_id, "Deleting machine");
        self.client
            .delete(&self.api_path, &Params::new())
            .await?
            .ensure_success()
    }

    pub fn deployer(&mut self) -> MachineDeployer<'_> {
        self.stage(OP_DEPLOY);
        MachineDeployer { handle: self }
    }

    pub fn releaser(&mut self) -> MachineReleaser<'_> {
        self.stage(OP_RELEASE);
        MachineReleaser { handle: self }
    }

    pub fn modifier(&mut self) -> MachineModifier<'_> {
        self.params.reset();
        MachineModifier { handle: self }
    }

    pub fn power_on(&mut self) -> MachinePowerOn<'_> {
        self.stage(OP_POWER_ON);
        MachinePowerOn { handle: self }
    }

    fn stage(&mut self, op: &str) {
        self.params.reset();
        self.params.set(OPERATION, op);
    }

    async fn post_staged(&self) -> Result<Machine> {
        self.client
            .post(&self.api_path, &self.params)
            .await?
            .into_value()
    }
}

/// `op=deploy` options.
#[derive(Debug)]
pub struct MachineDeployer<'a> {
    handle: &'a mut MachineHandle,
}

impl MachineDeployer<'_> {
    #[must_use]
    pub fn set_os_system(mut self, os_system: &str) -> Self {
        self.handle.params.set(OS_SYSTEM, os_system);
        self
    }

    /// Cloud-init user data, already base64 encoded.
    #[must_use]
    pub fn set_user_data(mut self, user_data: &str) -> Self {
        self.handle.params.set(USER_DATA, user_data);
        self
    }

    #[must_use]
    pub fn set_distro_series(mut self, distro_series: &str) -> Self {
        self.handle.params.set(DISTRO_SERIES, distro_series);
        self
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects the deployment.
    pub async fn deploy(self) -> Result<Machine> {
        info!(system_id = %self.handle.system_id, "Deploying machine");
        self.handle.post_staged().await
    }
}

/// `op=release` options.
#[derive(Debug)]
pub struct MachineReleaser<'a> {
    handle: &'a mut MachineHandle,
}

impl MachineReleaser<'_> {
    #[must_use]
    pub fn with_erase(mut self) -> Self {
        self.handle.params.set(ERASE, TRUE);
        self
    }

    #[must_use]
    pub fn with_quick_erase(mut self) -> Self {
        self.handle.params.set(QUICK_ERASE, TRUE);
        self
    }

    #[must_use]
    pub fn with_secure_erase(mut self) -> Self {
        self.handle.params.set(SECURE_ERASE, TRUE);
        self
    }

    #[must_use]
    pub fn with_force(mut self) -> Self {
        self.handle.params.set(FORCE, TRUE);
        self
    }

    #[must_use]
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.handle.params.set(COMMENT, comment);
        self
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects the release.
    pub async fn release(self) -> Result<Machine> {
        info!(system_id = %self.handle.system_id, "Releasing machine");
        self.handle.post_staged().await
    }
}

/// Attribute updates, sent as a PUT.
#[derive(Debug)]
pub struct MachineModifier<'a> {
    handle: &'a mut MachineHandle,
}

impl MachineModifier<'_> {
    /// Swap size in bytes.
    #[must_use]
    pub fn set_swap_size(mut self, swap_size: i64) -> Self {
        self.handle.params.set(SWAP_SIZE, swap_size.to_string());
        self
    }

    #[must_use]
    pub fn set_hostname(mut self, hostname: &str) -> Self {
        self.handle.params.set(HOSTNAME, hostname);
        self
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects the update.
    pub async fn update(self) -> Result<Machine> {
        info!(system_id = %self.handle.system_id, "Updating machine");
        self.handle
            .client
            .put_params(&self.handle.api_path, &self.handle.params)
            .await?
            .into_value()
    }
}

/// `op=power_on` options.
#[derive(Debug)]
pub struct MachinePowerOn<'a> {
    handle: &'a mut MachineHandle,
}

impl MachinePowerOn<'_> {
    #[must_use]
    pub fn with_comment(mut self, comment: &str) -> Self {
        self.handle.params.set(COMMENT, comment);
        self
    }

    /// # Errors
    /// Returns error if the request fails or MAAS cannot power the machine on.
    pub async fn power_on(self) -> Result<Machine> {
        info!(system_id = %self.handle.system_id, "Powering on machine");
        self.handle.post_staged().await
    }
}
