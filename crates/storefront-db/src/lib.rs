//! Storefront database layer
//!
//! Repository traits for catalog entities, inquiries, visitors and website
//! settings, with a Postgres implementation of each and an in-memory one used
//! by tests and database-less local runs.

pub mod db;

pub use db::{
    CatalogRepository, InMemoryCatalogRepository, InMemoryInquiryRepository,
    InMemorySettingsRepository, InMemoryVisitorRepository, InquiryRepository,
    PostgresCatalogRepository, PostgresInquiryRepository, PostgresSettingsRepository,
    PostgresVisitorRepository, Repositories, SettingsRepository, VisitorRepository,
};
