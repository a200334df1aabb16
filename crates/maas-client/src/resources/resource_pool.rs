//! Resource pools (`/resourcepools/`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;

const RESOURCE_POOLS_API_PATH: &str = "/resourcepools/";

/// A MAAS resource pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourcePool {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

/// Resource pools collection.
#[derive(Debug, Clone)]
pub struct ResourcePools {
    client: Arc<ApiClient>,
}

impl ResourcePools {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List resource pools, optionally filtered.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self, filter: Option<&Params>) -> Result<Vec<ResourcePool>> {
        let mut query = Params::new();
        if let Some(filter) = filter {
            query.copy(filter);
        }
        let envelope = self.client.get(RESOURCE_POOLS_API_PATH, &query).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    /// Fetch one resource pool by id.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn get(&self, id: i64) -> Result<ResourcePool> {
        let path = format!("{RESOURCE_POOLS_API_PATH}{id}/");
        self.client.get(&path, &Params::new()).await?.into_value()
    }
}
