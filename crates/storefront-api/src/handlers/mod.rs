//! HTTP handlers, grouped by resource.

pub mod catalog_admin;
pub mod catalog_public;
pub mod dashboard;
pub mod health;
pub mod inquiries;
pub mod settings;
pub mod visitors;

use storefront_core::models::CatalogKind;
use storefront_core::AppError;

use crate::error::HttpAppError;

/// Unknown collection names are a missing resource, not a bad request.
pub(crate) fn parse_kind(raw: &str) -> Result<CatalogKind, HttpAppError> {
    raw.parse::<CatalogKind>()
        .map_err(|_| HttpAppError(AppError::NotFound(format!("Unknown catalog '{}'", raw))))
}
