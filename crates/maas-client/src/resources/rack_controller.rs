//! Rack controllers (`/rackcontrollers/`).

use std::sync::Arc;

use tracing::info;

use super::keys::{OPERATION, OP_IMPORT_BOOT_IMAGES};
use crate::client::ApiClient;
use crate::error::Result;
use crate::params::Params;

const RACK_CONTROLLERS_API_PATH: &str = "/rackcontrollers/";

#[derive(Debug, Clone)]
pub struct RackControllers {
    client: Arc<ApiClient>,
}

impl RackControllers {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self { client }
    }

    /// Ask every rack controller to sync boot images from the region.
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects it.
    pub async fn import_boot_images(&self) -> Result<()> {
        info!("Importing boot images on rack controllers");
        let params = Params::new().with(OPERATION, OP_IMPORT_BOOT_IMAGES);
        self.client
            .post(RACK_CONTROLLERS_API_PATH, &params)
            .await?
            .ensure_success()
    }
}
