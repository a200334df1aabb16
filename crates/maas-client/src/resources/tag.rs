//! Machine tags (`/tags/`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::keys::{MACHINES, NAME, OPERATION, OP_ASSIGN, OP_REMOVE};
use super::null_as_default;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;

const TAGS_API_PATH: &str = "/tags/";

/// A MAAS tag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tag {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// XPath expression for automatic tags; empty for manual ones.
    #[serde(deserialize_with = "null_as_default")]
    pub definition: String,
    #[serde(deserialize_with = "null_as_default")]
    pub comment: String,
    #[serde(deserialize_with = "null_as_default")]
    pub kernel_opts: String,
    #[serde(deserialize_with = "null_as_default")]
    pub resource_uri: String,
}

/// Tags collection.
#[derive(Debug, Clone)]
pub struct Tags {
    client: Arc<ApiClient>,
}

impl Tags {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self) -> Result<Vec<Tag>> {
        let envelope = self.client.get(TAGS_API_PATH, &Params::new()).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    /// Create a manual tag. An empty name does nothing.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects the tag.
    pub async fn create(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Ok(());
        }
        info!(tag = name, "Creating tag");
        let params = Params::new().with(NAME, name);
        self.client
            .post(TAGS_API_PATH, &params)
            .await?
            .ensure_success()
    }

    /// Tag machines. Does nothing when `name` or `system_ids` is empty.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects it.
    pub async fn assign(&self, name: &str, system_ids: &[&str]) -> Result<()> {
        self.update_machines(name, OP_ASSIGN, system_ids).await
    }

    /// Untag machines. Does nothing when `name` or `system_ids` is empty.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects it.
    pub async fn unassign(&self, name: &str, system_ids: &[&str]) -> Result<()> {
        self.update_machines(name, OP_REMOVE, system_ids).await
    }

    async fn update_machines(&self, name: &str, op: &str, system_ids: &[&str]) -> Result<()> {
        if name.is_empty() || system_ids.is_empty() {
            debug!(tag = name, op, "Nothing to update");
            return Ok(());
        }

        info!(tag = name, op, machines = system_ids.len(), "Updating tagged machines");
        let path = format!("{TAGS_API_PATH}{}/", urlencoding::encode(name));
        let params = Params::new()
            .with(OPERATION, op)
            .with(MACHINES, system_ids.join(","));
        self.client.post(&path, &params).await?.ensure_success()
    }
}
