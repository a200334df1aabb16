//! Users (`/users/`).

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::keys::{OPERATION, OP_WHOAMI};
use super::null_as_default;
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;

const USERS_API_PATH: &str = "/users/";

/// A MAAS user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    #[serde(deserialize_with = "null_as_default")]
    pub username: String,
    #[serde(deserialize_with = "null_as_default")]
    pub email: String,
    #[serde(deserialize_with = "null_as_default")]
    pub is_superuser: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub is_local: bool,
}

#[derive(Debug, Clone)]
pub struct Users {
    client: Arc<ApiClient>,
}

impl Users {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// List all users.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self) -> Result<Vec<User>> {
        let envelope = self.client.get(USERS_API_PATH, &Params::new()).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    /// The user the API key belongs to.
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn whoami(&self) -> Result<User> {
        let params = Params::new().with(OPERATION, OP_WHOAMI);
        self.client.get(USERS_API_PATH, &params).await?.into_value()
    }
}
