#[cfg(feature = "storage-cloudinary")]
use crate::CloudinaryStore;
#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{AssetStore, AssetStoreBackend, StorageError, StorageResult};
use std::sync::Arc;
use storefront_core::Config;

/// Create the asset store selected by configuration
pub async fn create_asset_store(config: &Config) -> StorageResult<Arc<dyn AssetStore>> {
    let prefix = config.asset_folder_prefix().to_string();

    match config.asset_store_backend() {
        #[cfg(feature = "storage-s3")]
        AssetStoreBackend::S3 => {
            let bucket = config
                .s3_bucket()
                .map(String::from)
                .ok_or_else(|| StorageError::ConfigError("S3_BUCKET not configured".to_string()))?;
            let region = config.s3_region().map(String::from).ok_or_else(|| {
                StorageError::ConfigError("S3_REGION or AWS_REGION not configured".to_string())
            })?;
            let endpoint = config.s3_endpoint().map(String::from);

            let store = S3Storage::new(bucket, region, endpoint, prefix).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-s3"))]
        AssetStoreBackend::S3 => Err(StorageError::ConfigError(
            "S3 asset store not available (storage-s3 feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-local")]
        AssetStoreBackend::Local => {
            let base_path = config
                .local_storage_path()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_PATH not configured".to_string())
                })?;
            let base_url = config
                .local_storage_base_url()
                .map(String::from)
                .ok_or_else(|| {
                    StorageError::ConfigError("LOCAL_STORAGE_BASE_URL not configured".to_string())
                })?;

            let store = LocalStorage::new(base_path, base_url, prefix).await?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-local"))]
        AssetStoreBackend::Local => Err(StorageError::ConfigError(
            "Local asset store not available (storage-local feature not enabled)".to_string(),
        )),

        #[cfg(feature = "storage-cloudinary")]
        AssetStoreBackend::Cloudinary => {
            let missing = |name: &str| StorageError::ConfigError(format!("{} not configured", name));
            let store = CloudinaryStore::new(
                config
                    .cloudinary_cloud_name()
                    .map(String::from)
                    .ok_or_else(|| missing("CLOUDINARY_CLOUD_NAME"))?,
                config
                    .cloudinary_api_key()
                    .map(String::from)
                    .ok_or_else(|| missing("CLOUDINARY_API_KEY"))?,
                config
                    .cloudinary_api_secret()
                    .map(String::from)
                    .ok_or_else(|| missing("CLOUDINARY_API_SECRET"))?,
                prefix,
                config.cloudinary_api_base().map(String::from),
            )?;
            Ok(Arc::new(store))
        }

        #[cfg(not(feature = "storage-cloudinary"))]
        AssetStoreBackend::Cloudinary => Err(StorageError::ConfigError(
            "Cloudinary asset store not available (storage-cloudinary feature not enabled)"
                .to_string(),
        )),
    }
}
