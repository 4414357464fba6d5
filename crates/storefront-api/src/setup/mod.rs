//! Application setup and initialization
//!
//! Everything `main` needs to go from a loaded `Config` to a served router.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use storefront_core::Config;
use storefront_db::Repositories;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config.validate().context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment());
    tracing::info!("Configuration loaded and validated successfully");

    let repositories = match database::setup_database(&config).await? {
        Some(pool) => Repositories::postgres(pool),
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory repositories");
            Repositories::in_memory()
        }
    };

    let store = storage::setup_storage(&config).await?;

    let state = Arc::new(AppState::new(&config, repositories, store));
    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
