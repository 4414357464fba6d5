//! Application state shared by every handler.

use std::sync::Arc;

use storefront_core::Config;
use storefront_db::Repositories;
use storefront_storage::AssetStore;

use crate::services::{BrandingService, MediaLifecycleService};

/// Upload limits and allowlists applied while reading multipart forms.
#[derive(Clone, Debug)]
pub struct UploadLimits {
    pub max_upload_bytes: usize,
    pub allowed_image_content_types: Vec<String>,
    pub allowed_video_content_types: Vec<String>,
}

impl UploadLimits {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes(),
            allowed_image_content_types: config.allowed_image_content_types().to_vec(),
            allowed_video_content_types: config.allowed_video_content_types().to_vec(),
        }
    }

    /// Images and videos, the gallery allowlist.
    pub fn allowed_media_types(&self) -> Vec<String> {
        self.allowed_image_content_types
            .iter()
            .chain(self.allowed_video_content_types.iter())
            .cloned()
            .collect()
    }
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub admin_api_key: String,
    pub trusted_proxy_count: usize,
}

#[derive(Clone)]
pub struct AppState {
    pub repositories: Repositories,
    pub store: Arc<dyn AssetStore>,
    pub media: MediaLifecycleService,
    pub branding: BrandingService,
    pub uploads: UploadLimits,
    pub security: SecurityConfig,
}

impl AppState {
    pub fn new(
        config: &Config,
        repositories: Repositories,
        store: Arc<dyn AssetStore>,
    ) -> Self {
        let media = MediaLifecycleService::new(
            store.clone(),
            repositories.catalog.clone(),
            config.max_gallery_files(),
        );
        let branding = BrandingService::new(store.clone(), repositories.settings.clone());

        Self {
            repositories,
            store,
            media,
            branding,
            uploads: UploadLimits::from_config(config),
            security: SecurityConfig {
                admin_api_key: config.admin_api_key().to_string(),
                trusted_proxy_count: crate::constants::TRUSTED_PROXY_COUNT,
            },
        }
    }
}
