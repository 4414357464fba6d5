//! Configuration module
//!
//! Environment driven configuration for the storefront service: server,
//! database, admin gate, asset store backend and upload limits.

use std::env;

use crate::constants::{DEFAULT_ASSET_FOLDER_PREFIX, MAX_GALLERY_FILES_PER_REQUEST};
use crate::storage_types::AssetStoreBackend;

const SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
const UPLOAD_TIMEOUT_SECS: u64 = 600;
const HTTP_CONCURRENCY_LIMIT: usize = 256;
const MIN_ADMIN_KEY_LEN: usize = 32;

/// Resolved storefront settings.
#[derive(Clone, Debug)]
pub struct StorefrontConfig {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Absent means the in-memory repositories are used.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub admin_api_key: String,
    pub http_concurrency_limit: usize,
    // Asset store
    pub asset_store_backend: AssetStoreBackend,
    pub asset_folder_prefix: String,
    pub local_storage_path: Option<String>,
    pub local_storage_base_url: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_endpoint: Option<String>, // MinIO, Spaces and other S3-compatible hosts
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub cloudinary_api_base: Option<String>,
    // Uploads
    pub max_upload_bytes: usize,
    pub max_gallery_files: usize,
    pub upload_timeout_secs: u64,
    pub allowed_image_content_types: Vec<String>,
    pub allowed_video_content_types: Vec<String>,
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config(pub Box<StorefrontConfig>);

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

impl StorefrontConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = var("ENVIRONMENT")
            .or_else(|| var("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = var("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let asset_store_backend = match var("ASSET_STORE_BACKEND") {
            Some(raw) => raw.parse::<AssetStoreBackend>()?,
            None => AssetStoreBackend::Local,
        };

        Ok(Self {
            server_port: var("SERVER_PORT")
                .or_else(|| var("PORT"))
                .unwrap_or_else(|| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("SERVER_PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: var("DATABASE_URL"),
            db_max_connections: var("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: var("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            admin_api_key: var("ADMIN_API_KEY")
                .ok_or_else(|| anyhow::anyhow!("ADMIN_API_KEY must be set for admin routes"))?,
            http_concurrency_limit: var("HTTP_CONCURRENCY_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HTTP_CONCURRENCY_LIMIT),
            asset_store_backend,
            asset_folder_prefix: var("ASSET_FOLDER_PREFIX")
                .unwrap_or_else(|| DEFAULT_ASSET_FOLDER_PREFIX.to_string()),
            local_storage_path: var("LOCAL_STORAGE_PATH"),
            local_storage_base_url: var("LOCAL_STORAGE_BASE_URL"),
            s3_bucket: var("S3_BUCKET"),
            s3_region: var("S3_REGION").or_else(|| var("AWS_REGION")),
            s3_endpoint: var("S3_ENDPOINT"),
            cloudinary_cloud_name: var("CLOUDINARY_CLOUD_NAME"),
            cloudinary_api_key: var("CLOUDINARY_API_KEY"),
            cloudinary_api_secret: var("CLOUDINARY_API_SECRET"),
            cloudinary_api_base: var("CLOUDINARY_API_BASE"),
            max_upload_bytes: var("MAX_UPLOAD_BYTES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_UPLOAD_BYTES),
            max_gallery_files: var("MAX_GALLERY_FILES")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_GALLERY_FILES_PER_REQUEST),
            upload_timeout_secs: var("UPLOAD_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(UPLOAD_TIMEOUT_SECS),
            allowed_image_content_types: split_list(
                &var("ALLOWED_IMAGE_CONTENT_TYPES").unwrap_or_else(|| {
                    "image/jpeg,image/png,image/gif,image/webp,image/avif".to_string()
                }),
            ),
            allowed_video_content_types: split_list(
                &var("ALLOWED_VIDEO_CONTENT_TYPES")
                    .unwrap_or_else(|| "video/mp4,video/webm,video/quicktime".to_string()),
            ),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.admin_api_key.len() < MIN_ADMIN_KEY_LEN {
            return Err(anyhow::anyhow!(
                "ADMIN_API_KEY must be at least {} characters long",
                MIN_ADMIN_KEY_LEN
            ));
        }

        if self.max_gallery_files == 0 {
            return Err(anyhow::anyhow!("MAX_GALLERY_FILES must be greater than 0"));
        }

        if self.max_upload_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_BYTES must be greater than 0"));
        }

        match self.asset_store_backend {
            AssetStoreBackend::S3 => {
                if self.s3_bucket.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_BUCKET must be set when using S3 asset store backend"
                    ));
                }
                if self.s3_region.is_none() {
                    return Err(anyhow::anyhow!(
                        "S3_REGION or AWS_REGION must be set when using S3 asset store backend"
                    ));
                }
            }
            AssetStoreBackend::Local => {
                if self.local_storage_path.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_PATH must be set when using local asset store backend"
                    ));
                }
                if self.local_storage_base_url.is_none() {
                    return Err(anyhow::anyhow!(
                        "LOCAL_STORAGE_BASE_URL must be set when using local asset store backend"
                    ));
                }
            }
            AssetStoreBackend::Cloudinary => {
                if self.cloudinary_cloud_name.is_none()
                    || self.cloudinary_api_key.is_none()
                    || self.cloudinary_api_secret.is_none()
                {
                    return Err(anyhow::anyhow!(
                        "CLOUDINARY_CLOUD_NAME, CLOUDINARY_API_KEY and CLOUDINARY_API_SECRET must be set when using cloudinary asset store backend"
                    ));
                }
            }
        }

        Ok(())
    }
}

impl Config {
    fn inner(&self) -> &StorefrontConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        Ok(Config(Box::new(StorefrontConfig::from_env()?)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.inner().environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn server_port(&self) -> u16 {
        self.inner().server_port
    }

    pub fn environment(&self) -> &str {
        &self.inner().environment
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.inner().cors_origins
    }

    pub fn database_url(&self) -> Option<&str> {
        self.inner().database_url.as_deref()
    }

    pub fn db_max_connections(&self) -> u32 {
        self.inner().db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.inner().db_timeout_seconds
    }

    pub fn admin_api_key(&self) -> &str {
        &self.inner().admin_api_key
    }

    pub fn http_concurrency_limit(&self) -> usize {
        self.inner().http_concurrency_limit
    }

    pub fn asset_store_backend(&self) -> AssetStoreBackend {
        self.inner().asset_store_backend
    }

    pub fn asset_folder_prefix(&self) -> &str {
        &self.inner().asset_folder_prefix
    }

    pub fn local_storage_path(&self) -> Option<&str> {
        self.inner().local_storage_path.as_deref()
    }

    pub fn local_storage_base_url(&self) -> Option<&str> {
        self.inner().local_storage_base_url.as_deref()
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.inner().s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.inner().s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.inner().s3_endpoint.as_deref()
    }

    pub fn cloudinary_cloud_name(&self) -> Option<&str> {
        self.inner().cloudinary_cloud_name.as_deref()
    }

    pub fn cloudinary_api_key(&self) -> Option<&str> {
        self.inner().cloudinary_api_key.as_deref()
    }

    pub fn cloudinary_api_secret(&self) -> Option<&str> {
        self.inner().cloudinary_api_secret.as_deref()
    }

    pub fn cloudinary_api_base(&self) -> Option<&str> {
        self.inner().cloudinary_api_base.as_deref()
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.inner().max_upload_bytes
    }

    pub fn max_gallery_files(&self) -> usize {
        self.inner().max_gallery_files
    }

    pub fn upload_timeout_secs(&self) -> u64 {
        self.inner().upload_timeout_secs
    }

    pub fn allowed_image_content_types(&self) -> &[String] {
        &self.inner().allowed_image_content_types
    }

    pub fn allowed_video_content_types(&self) -> &[String] {
        &self.inner().allowed_video_content_types
    }
}
