//! Availability zones (`/zones/`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;

const ZONES_API_PATH: &str = "/zones/";

/// A MAAS availability zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Zone {
    pub id: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub description: String,
}

/// Zones collection.
#[derive(Debug, Clone)]
pub struct Zones {
    client: Arc<ApiClient>,
}

impl Zones {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List all zones.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self) -> Result<Vec<Zone>> {
        let envelope = self.client.get(ZONES_API_PATH, &Params::new()).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }
}
