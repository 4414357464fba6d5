//! Public catalog reads: visible entries only.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storefront_core::models::CatalogEntity;

use super::parse_kind;
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CatalogQuery {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CatalogListing {
    pub items: Vec<CatalogEntity>,
    pub categories: Vec<String>,
}

#[tracing::instrument(skip(state))]
pub async fn list_catalog(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogListing>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"));

    let catalog = &state.repositories.catalog;
    let items = catalog.list_visible(kind, category).await?;
    let categories = catalog.categories(kind).await?;

    Ok(Json(CatalogListing { items, categories }))
}

#[tracing::instrument(skip(state))]
pub async fn get_by_slug(
    State(state): State<Arc<AppState>>,
    Path((kind, slug)): Path<(String, String)>,
) -> Result<Json<CatalogEntity>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let entity = state.repositories.catalog.get_by_slug(kind, &slug).await?;
    Ok(Json(entity))
}
