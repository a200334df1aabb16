//! Boot resource collection, creation, and chunked upload.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

use super::models::BootResource;
use crate::client::ApiClient;
use crate::error::{MaasError, Result};
use crate::params::Params;
use crate::resources::keys::{ARCHITECTURE, FILE_TYPE, NAME, SHA256, SIZE, TITLE};

const BOOT_RESOURCES_API_PATH: &str = "/boot-resources/";

/// Size of each upload PUT (4 MiB).
pub const UPLOAD_CHUNK_SIZE: usize = 1 << 22;

/// Boot resources collection.
#[derive(Debug, Clone)]
pub struct BootResources {
    client: Arc<ApiClient>,
    params: Params,
    file_path: PathBuf,
}

impl BootResources {
    pub(crate) fn new(client: Arc<ApiClient>) -> Self {
        Self {
            client,
            params: Params::new(),
            file_path: PathBuf::new(),
        }
    }

    /// List boot resources, optionally filtered (e.g. `type=uploaded`).
    ///
    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn list(&self, filter: Option<&Params>) -> Result<Vec<BootResource>> {
        let mut query = Params::new();
        if let Some(filter) = filter {
            query.copy(filter);
        }
        let envelope = self.client.get(BOOT_RESOURCES_API_PATH, &query).await?;
        Ok(envelope.decode()?.unwrap_or_default())
    }

    /// Handle for one boot resource. No request is made.
    #[must_use]
    pub fn boot_resource(&self, id: i64) -> BootResourceHandle {
        BootResourceHandle::new(Arc::clone(&self.client), id, None)
    }

    /// Stage a new uploaded image. `sha256` and `size` describe the file at
    /// `file_path`, which is read later by [`BootResourceHandle::upload`].
    pub fn builder(
        &mut self,
        name: &str,
        architecture: &str,
        sha256: &str,
        file_path: impl Into<PathBuf>,
        size: u64,
    ) -> BootResourceBuilder<'_> {
        self.params.reset();
        self.params
            .set(NAME, name)
            .set(ARCHITECTURE, architecture)
            .set(SHA256, sha256)
            .set(SIZE, size.to_string());
        self.file_path = file_path.into();
        BootResourceBuilder { resources: self }
    }
}

/// Pending boot resource creation.
#[derive(Debug)]
pub struct BootResourceBuilder<'a> {
    resources: &'a mut BootResources,
}

impl BootResourceBuilder<'_> {
    #[must_use]
    pub fn with_title(mut self, title: &str) -> Self {
        self.resources.params.set(TITLE, title);
        self
    }

    /// File type, e.g. `tgz` or `ddraw`.
    #[must_use]
    pub fn with_file_type(mut self, file_type: &str) -> Self {
        self.resources.params.set(FILE_TYPE, file_type);
        self
    }

    /// Create the resource with a multipart POST.
    ///
    /// Returns a handle bound to the staged file path together with the
    /// created snapshot, ready for [`BootResourceHandle::upload`].
    ///
    /// # Errors
    /// Returns error if the request fails or MAAS rejects the resource.
    pub async fn create(self) -> Result<(BootResourceHandle, BootResource)> {
        info!(
            name = ?self.resources.params.get(NAME),
            architecture = ?self.resources.params.get(ARCHITECTURE),
            "Creating boot resource"
        );
        let resource: BootResource = self
            .resources
            .client
            .post_multipart(BOOT_RESOURCES_API_PATH, &self.resources.params)
            .await?
            .into_value()?;

        let handle = BootResourceHandle::new(
            Arc::clone(&self.resources.client),
            resource.id,
            Some(self.resources.file_path.clone()),
        );
        Ok((handle, resource))
    }
}

/// One boot resource, addressed by id.
#[derive(Debug, Clone)]
pub struct BootResourceHandle {
    client: Arc<ApiClient>,
    id: i64,
    api_path: String,
    file_path: Option<PathBuf>,
}

impl BootResourceHandle {
    fn new(client: Arc<ApiClient>, id: i64, file_path: Option<PathBuf>) -> Self {
        Self {
            client,
            id,
            api_path: format!("{BOOT_RESOURCES_API_PATH}{id}/"),
            file_path,
        }
    }

    #[must_use]
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Local file bound at creation, if any.
    #[must_use]
    pub fn file_path(&self) -> Option<&Path> {
        self.file_path.as_deref()
    }

    /// # Errors
    /// Returns error if the request fails or the response cannot be decoded.
    pub async fn get(&self) -> Result<BootResource> {
        self.client
            .get(&self.api_path, &Params::new())
            .await?
            .into_value()
    }

    /// # Errors
    /// Returns error if the request fails or MAAS rejects it.
    pub async fn delete(&self) -> Result<()> {
        info!(id = self.id, "Deleting boot resource");
        self.client
            .delete(&self.api_path, &Params::new())
            .await?
            .ensure_success()
    }

    /// Upload the file bound at creation into `resource`'s upload slot.
    ///
    /// # Errors
    /// Returns [`MaasError::InvalidState`] if the handle has no file path,
    /// plus everything [`BootResourceHandle::upload_from`] returns.
    pub async fn upload(&self, resource: &BootResource) -> Result<()> {
        let path = self.file_path.as_deref().ok_or_else(|| {
            MaasError::InvalidState(format!("boot resource {} has no file to upload", self.id))
        })?;
        self.upload_from(path, resource).await
    }

    /// Upload `path` in [`UPLOAD_CHUNK_SIZE`] pieces, one PUT each.
    ///
    /// Chunks are sent in order and the first failure stops the upload.
    ///
    /// # Errors
    /// Returns error if the resource has no single-file set, the file cannot
    /// be read, or a PUT fails.
    pub async fn upload_from(&self, path: &Path, resource: &BootResource) -> Result<()> {
        let uri = resource.latest_set()?.upload_uri()?;
        let mut file = File::open(path).await?;
        let mut buf = vec![0u8; UPLOAD_CHUNK_SIZE];
        let mut sent = 0usize;

        info!(id = self.id, path = %path.display(), uri = %uri, "Uploading boot resource");
        loop {
            let n = read_chunk(&mut file, &mut buf).await?;
            if n == 0 {
                break;
            }
            self.client
                .put(&uri, buf[..n].to_vec())
                .await?
                .ensure_success()?;
            sent += n;
            debug!(id = self.id, bytes = sent, "Uploaded chunk");
            if n < UPLOAD_CHUNK_SIZE {
                break;
            }
        }

        info!(id = self.id, bytes = sent, "Boot resource upload complete");
        Ok(())
    }
}

/// Fill `buf` from `reader`, stopping early only at end of input.
async fn read_chunk<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> Arc<ApiClient> {
        Arc::new(ApiClient::new("http://maas.local/MAAS", "ck:tk:ts").unwrap())
    }

    #[tokio::test]
    async fn test_read_chunk_fills_across_short_reads() {
        let data: Vec<u8> = (0..10u8).collect();
        let mut reader = (&data[..3]).chain(&data[3..]);
        let mut buf = [0u8; 8];

        assert_eq!(read_chunk(&mut reader, &mut buf).await.unwrap(), 8);
        assert_eq!(&buf, &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(read_chunk(&mut reader, &mut buf).await.unwrap(), 2);
        assert_eq!(read_chunk(&mut reader, &mut buf).await.unwrap(), 0);
    }

    #[test]
    fn test_builder_stages_required_fields() {
        let mut resources = BootResources::new(client());
        let _ = resources
            .builder("custom/u-1804", "amd64/generic", "abc123", "/tmp/image.tgz", 1024)
            .with_title("Ubuntu custom")
            .with_file_type("tgz");

        assert_eq!(resources.params.get(NAME), Some("custom/u-1804"));
        assert_eq!(resources.params.get(SIZE), Some("1024"));
        assert_eq!(resources.params.get(FILE_TYPE), Some("tgz"));
        assert_eq!(resources.file_path, PathBuf::from("/tmp/image.tgz"));
    }

    #[tokio::test]
    async fn test_upload_without_file_path_fails() {
        let handle = BootResources::new(client()).boot_resource(7);
        let result = handle.upload(&BootResource::default()).await;
        assert!(matches!(result, Err(MaasError::InvalidState(_))));
    }
}
