//! Network spaces (`/spaces/`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::null_as_default;
use super::subnet::Subnet;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;

const SPACES_API_PATH: &str = "/spaces/";

/// A MAAS space and its subnets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Space {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub subnets: Vec<Subnet>,
}

#[derive(Debug, Clone)]
pub struct Spaces {
    client: Arc<ApiClient>,
}

impl Spaces {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List all spaces.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self) -> Result<Vec<Space>> {
        let envelope = self.client.get(SPACES_API_PATH, &Params::new()).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }
}
