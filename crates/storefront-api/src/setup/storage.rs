//! Asset store setup

use anyhow::{Context, Result};
use std::sync::Arc;
use storefront_core::Config;
use storefront_storage::{create_asset_store, AssetStore};

pub async fn setup_storage(config: &Config) -> Result<Arc<dyn AssetStore>> {
    tracing::info!("Initializing asset store...");
    let store = create_asset_store(config)
        .await
        .context("Failed to initialize asset store")?;
    tracing::info!(
        backend = %store.backend_type(),
        prefix = %config.asset_folder_prefix(),
        "Asset store initialized"
    );
    Ok(store)
}
