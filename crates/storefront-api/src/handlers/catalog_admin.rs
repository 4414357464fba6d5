//! Back-office catalog management.
//!
//! Multipart forms are parsed into a [`MediaForm`] and handed to the media
//! lifecycle service; the handlers only translate results into notices.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use storefront_core::models::CatalogEntity;
use storefront_core::AppError;
use uuid::Uuid;

use super::parse_kind;
use crate::context::{AdminContext, Notice};
use crate::error::HttpAppError;
use crate::state::AppState;
use crate::utils::upload::{MediaForm, FEATURED_FIELD};

#[tracing::instrument(skip_all, fields(kind = %kind, client_ip = %admin.client_ip))]
pub async fn list_entries(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<CatalogEntity>>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let entries = state.repositories.catalog.list_by_kind(kind).await?;
    Ok(Json(entries))
}

#[tracing::instrument(skip_all, fields(kind = %kind, entity_id = %id))]
pub async fn get_entry(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<CatalogEntity>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let entity = state.repositories.catalog.get(kind, id).await?;
    Ok(Json(entity))
}

#[tracing::instrument(skip_all, fields(kind = %kind, client_ip = %admin.client_ip))]
pub async fn create_entry(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let form = MediaForm::read(multipart, &state.uploads, kind.gallery_field()).await?;
    let fields = form.catalog_fields()?;

    let created = state
        .media
        .create_with_media(kind, fields, form.featured, form.gallery)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Notice::success(
            format!("{} created successfully", kind.label()),
            created,
        )),
    ))
}

#[tracing::instrument(skip_all, fields(kind = %kind, entity_id = %id, client_ip = %admin.client_ip))]
pub async fn update_entry(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, Uuid)>,
    multipart: Multipart,
) -> Result<Json<Notice<CatalogEntity>>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let form = MediaForm::read(multipart, &state.uploads, kind.gallery_field()).await?;
    let fields = form.catalog_fields()?;

    let outcome = state
        .media
        .update_with_media(kind, id, fields, form.featured, form.gallery)
        .await?;

    Ok(Json(Notice::from_outcome(
        format!("{} updated successfully", kind.label()),
        outcome,
        "update_entry",
    )))
}

#[tracing::instrument(skip_all, fields(kind = %kind, entity_id = %id, client_ip = %admin.client_ip))]
pub async fn delete_entry(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<Notice<CatalogEntity>>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let outcome = state.media.delete_entity(kind, id).await?;

    Ok(Json(Notice::from_outcome(
        format!("{} deleted successfully", kind.label()),
        outcome,
        "delete_entry",
    )))
}

#[tracing::instrument(skip_all, fields(kind = %kind, entity_id = %id, client_ip = %admin.client_ip))]
pub async fn replace_featured(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, Uuid)>,
    multipart: Multipart,
) -> Result<Json<Notice<CatalogEntity>>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let form = MediaForm::read(multipart, &state.uploads, kind.gallery_field()).await?;
    let file = match (form.featured, form.gallery.is_empty()) {
        (Some(file), true) => file,
        _ => {
            return Err(AppError::InvalidInput(format!(
                "Send exactly one '{}' file",
                FEATURED_FIELD
            ))
            .into())
        }
    };

    let outcome = state.media.replace_featured(kind, id, file).await?;

    Ok(Json(Notice::from_outcome(
        "Featured image replaced",
        outcome,
        "replace_featured",
    )))
}

#[tracing::instrument(skip_all, fields(kind = %kind, entity_id = %id, client_ip = %admin.client_ip))]
pub async fn append_gallery(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, Uuid)>,
    multipart: Multipart,
) -> Result<Json<Notice<CatalogEntity>>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let form = MediaForm::read(multipart, &state.uploads, kind.gallery_field()).await?;
    if form.featured.is_some() {
        return Err(AppError::InvalidInput(format!(
            "Gallery uploads go in the '{}' field",
            kind.gallery_field()
        ))
        .into());
    }

    let added = form.gallery.len();
    let saved = state.media.append_gallery(kind, id, form.gallery).await?;

    Ok(Json(Notice::success(
        format!("{} file(s) added to the gallery", added),
        saved,
    )))
}

#[tracing::instrument(skip_all, fields(kind = %kind, entity_id = %id, item_id = %item_id, client_ip = %admin.client_ip))]
pub async fn remove_gallery_item(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path((kind, id, item_id)): Path<(String, Uuid, Uuid)>,
) -> Result<Json<Notice<CatalogEntity>>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let outcome = state.media.remove_gallery_item(kind, id, item_id).await?;

    Ok(Json(Notice::from_outcome(
        "Gallery item removed",
        outcome,
        "remove_gallery_item",
    )))
}

#[tracing::instrument(skip_all, fields(kind = %kind, entity_id = %id))]
pub async fn toggle_visibility(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Json<Notice<CatalogEntity>>, HttpAppError> {
    let kind = parse_kind(&kind)?;
    let entity = state.repositories.catalog.toggle_visibility(kind, id).await?;
    let message = if entity.is_visible {
        format!("{} is now visible", kind.label())
    } else {
        format!("{} is now hidden", kind.label())
    };
    Ok(Json(Notice::success(message, entity)))
}
