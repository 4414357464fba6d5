use crate::keys::generate_asset_key;
use crate::traits::{AssetReader, AssetStore, StorageError, StorageResult};
use crate::{AssetStoreBackend, MediaKind, MediaRef};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncRead;

/// Local filesystem asset store
#[derive(Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
    base_url: String,
    folder_prefix: String,
}

impl LocalStorage {
    /// Create a new LocalStorage instance
    ///
    /// # Arguments
    /// * `base_path` - Root directory for asset files (e.g., "/var/lib/storefront/media")
    /// * `base_url` - Base URL the files are served from (e.g., "http://localhost:3000/media")
    /// * `folder_prefix` - Top-level folder for every key (e.g., "storefront")
    pub async fn new(
        base_path: impl Into<PathBuf>,
        base_url: String,
        folder_prefix: String,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create storage directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        Ok(LocalStorage {
            base_path,
            base_url,
            folder_prefix,
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Convert a remote id to a filesystem path with traversal checks
    fn key_to_path(&self, storage_key: &str) -> StorageResult<PathBuf> {
        if storage_key.is_empty() || storage_key.contains("..") || storage_key.starts_with('/') {
            return Err(StorageError::InvalidKey(
                "Storage key contains invalid characters".to_string(),
            ));
        }

        let path = self.base_path.join(storage_key);

        let base_canonical = self.base_path.canonicalize().map_err(|e| {
            StorageError::ConfigError(format!("Failed to canonicalize base path: {}", e))
        })?;

        if let Ok(canonical) = path.canonicalize() {
            if canonical.strip_prefix(&base_canonical).is_err() {
                return Err(StorageError::InvalidKey(
                    "Storage key resolves outside storage directory".to_string(),
                ));
            }
        }

        Ok(path)
    }

    fn generate_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), key)
    }

    async fn ensure_parent_dir(&self, path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Writes `reader` to `path` and syncs it. On failure the partial file is
    /// removed, so no key is left pointing at truncated content.
    async fn write_object<R>(&self, path: &Path, reader: &mut R) -> StorageResult<u64>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        self.ensure_parent_dir(path).await?;

        let mut file = fs::File::create(path).await.map_err(|e| {
            StorageError::UploadFailed(format!("Failed to create file {}: {}", path.display(), e))
        })?;

        let written = async {
            let n = tokio::io::copy(reader, &mut file).await?;
            file.sync_all().await?;
            Ok::<u64, std::io::Error>(n)
        }
        .await;

        match written {
            Ok(n) => Ok(n),
            Err(e) => {
                drop(file);
                if let Err(cleanup) = fs::remove_file(path).await {
                    tracing::warn!(
                        path = %path.display(),
                        error = %cleanup,
                        "Failed to remove partial upload"
                    );
                }
                Err(StorageError::UploadFailed(format!(
                    "Failed to write file {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }
}

#[async_trait]
impl AssetStore for LocalStorage {
    async fn upload(
        &self,
        folder: &str,
        content_type: &str,
        data: Bytes,
    ) -> StorageResult<MediaRef> {
        let key = generate_asset_key(&self.folder_prefix, folder, content_type)?;
        let path = self.key_to_path(&key)?;
        let size = data.len();

        let start = std::time::Instant::now();
        self.write_object(&path, &mut std::io::Cursor::new(data)).await?;

        let url = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage upload successful"
        );

        Ok(MediaRef::new(url, key, MediaKind::from_mime(content_type)))
    }

    async fn upload_stream(
        &self,
        folder: &str,
        content_type: &str,
        _content_length: Option<u64>,
        mut reader: AssetReader,
    ) -> StorageResult<MediaRef> {
        let key = generate_asset_key(&self.folder_prefix, folder, content_type)?;
        let path = self.key_to_path(&key)?;
        let start = std::time::Instant::now();

        let bytes_copied = self.write_object(&path, &mut reader).await?;

        let url = self.generate_url(&key);

        tracing::info!(
            path = %path.display(),
            key = %key,
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage stream upload successful"
        );

        Ok(MediaRef::new(url, key, MediaKind::from_mime(content_type)))
    }

    async fn delete(&self, remote_id: &str, _kind: MediaKind) -> StorageResult<()> {
        let path = self.key_to_path(remote_id)?;
        let start = std::time::Instant::now();

        match fs::remove_file(&path).await {
            Ok(()) => {}
            // Already gone, or lost a race with another delete of the same id.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => {
                return Err(StorageError::DeleteFailed(format!(
                    "Failed to delete file {}: {}",
                    path.display(),
                    e
                )))
            }
        }

        tracing::info!(
            path = %path.display(),
            key = %remote_id,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Local storage delete successful"
        );

        Ok(())
    }

    async fn exists(&self, remote_id: &str, _kind: MediaKind) -> StorageResult<bool> {
        let path = self.key_to_path(remote_id)?;
        fs::try_exists(&path).await.map_err(|e| {
            StorageError::BackendError(format!("Failed to stat {}: {}", path.display(), e))
        })
    }

    fn backend_type(&self) -> AssetStoreBackend {
        AssetStoreBackend::Local
    }
}
