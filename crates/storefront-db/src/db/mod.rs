//! Database repositories for data access layer
//!
//! Each domain document has a trait, a Postgres implementation and an
//! in-memory implementation with identical semantics.

pub mod catalog;
pub mod inquiry;
pub mod memory;
pub mod settings;
pub mod visitor;

use std::sync::Arc;

use sqlx::PgPool;
use storefront_core::AppError;

pub use catalog::{CatalogRepository, PostgresCatalogRepository};
pub use inquiry::{InquiryRepository, PostgresInquiryRepository};
pub use memory::{
    InMemoryCatalogRepository, InMemoryInquiryRepository, InMemorySettingsRepository,
    InMemoryVisitorRepository,
};
pub use settings::{PostgresSettingsRepository, SettingsRepository};
pub use visitor::{PostgresVisitorRepository, VisitorRepository};

/// Every repository the service needs, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub catalog: Arc<dyn CatalogRepository>,
    pub inquiries: Arc<dyn InquiryRepository>,
    pub visitors: Arc<dyn VisitorRepository>,
    pub settings: Arc<dyn SettingsRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            catalog: Arc::new(PostgresCatalogRepository::new(pool.clone())),
            inquiries: Arc::new(PostgresInquiryRepository::new(pool.clone())),
            visitors: Arc::new(PostgresVisitorRepository::new(pool.clone())),
            settings: Arc::new(PostgresSettingsRepository::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            catalog: Arc::new(InMemoryCatalogRepository::new()),
            inquiries: Arc::new(InMemoryInquiryRepository::new()),
            visitors: Arc::new(InMemoryVisitorRepository::new()),
            settings: Arc::new(InMemorySettingsRepository::new()),
        }
    }
}

/// Map insert/update failures, turning unique violations into conflicts.
pub(crate) fn map_write_error(err: sqlx::Error, conflict_message: &str) -> AppError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(conflict_message.to_string());
        }
    }
    AppError::Database(err)
}

/// Stored enum text that no longer parses means the row was written by something else.
pub(crate) fn corrupt_column(column: &str, err: anyhow::Error) -> AppError {
    AppError::Internal(format!("Invalid value in column {}: {}", column, err))
}
