//! Client configuration.
//!
//! Values come from the environment (`MAAS_ENDPOINT`, `MAAS_API_KEY`,
//! `MAAS_TIMEOUT_SECS`), a YAML file, or are built directly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::auth::Credential;
use crate::error::{MaasError, Result};

/// Default timeout for API requests.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Path prefix of every MAAS API resource.
const API_PREFIX: &str = "/api/2.0";

/// Connection settings for a MAAS region controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// MAAS endpoint, e.g. `http://10.11.130.11:5240/MAAS`.
    pub endpoint: String,
    /// API key, `<consumer key>:<token key>:<token secret>`.
    pub api_key: String,
    /// Connect timeout, and total timeout for calls other than uploads.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ClientConfig {
    #[must_use]
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Read `MAAS_ENDPOINT`, `MAAS_API_KEY` and optional `MAAS_TIMEOUT_SECS`.
    ///
    /// # Errors
    /// Returns [`MaasError::Config`] if a required variable is missing or
    /// the timeout is not a number.
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("MAAS_ENDPOINT")
            .map_err(|_| MaasError::Config("MAAS_ENDPOINT is not set".to_string()))?;
        let api_key = std::env::var("MAAS_API_KEY")
            .map_err(|_| MaasError::Config("MAAS_API_KEY is not set".to_string()))?;
        let timeout_secs = match std::env::var("MAAS_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                MaasError::Config(format!("MAAS_TIMEOUT_SECS is not a number: {raw}"))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            endpoint,
            api_key,
            timeout_secs,
        })
    }

    /// Load from a YAML file.
    ///
    /// # Errors
    /// Returns [`MaasError::Io`] if the file cannot be read and
    /// [`MaasError::Config`] if it is not valid YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse from YAML text.
    ///
    /// # Errors
    /// Returns [`MaasError::Config`] if the text is not a valid config.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| MaasError::Config(format!("invalid client config: {e}")))
    }

    /// Check the endpoint is a URL and the API key has three parts.
    ///
    /// # Errors
    /// Returns [`MaasError::Config`] describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.endpoint)
            .map_err(|e| MaasError::Config(format!("invalid endpoint {}: {e}", self.endpoint)))?;
        self.api_key.parse::<Credential>()?;
        Ok(())
    }

    /// `<endpoint>/api/2.0`.
    #[must_use]
    pub fn base_url(&self) -> String {
        Self::base_url_for(&self.endpoint)
    }

    pub(crate) fn base_url_for(endpoint: &str) -> String {
        format!("{}{API_PREFIX}", endpoint.trim_end_matches('/'))
    }
}
