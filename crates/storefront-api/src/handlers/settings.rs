//! Website settings: public read, admin content, branding images and the
//! about page team.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use storefront_core::models::{BrandingSlot, TeamMember, UpdateSettingsRequest, WebsiteSettings};
use storefront_core::AppError;
use uuid::Uuid;

use crate::context::{AdminContext, Notice};
use crate::error::{HttpAppError, ValidatedJson};
use crate::services::UploadFile;
use crate::state::{AppState, UploadLimits};
use crate::utils::upload::MediaForm;

/// Multipart field carrying a logo, about image or team portrait.
pub const BRANDING_FIELD: &str = "image";

/// Public view: inactive team members are left out.
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WebsiteSettings>, HttpAppError> {
    Ok(Json(state.branding.current().await?.for_public()))
}

/// Reads a form whose only file part is an optional image.
async fn read_image_form(
    state: &AppState,
    multipart: Multipart,
) -> Result<(MediaForm, Option<UploadFile>), HttpAppError> {
    let limits = UploadLimits {
        allowed_video_content_types: Vec::new(),
        ..state.uploads.clone()
    };
    let mut form = MediaForm::read(multipart, &limits, BRANDING_FIELD).await?;
    if form.featured.is_some() || form.gallery.len() > 1 {
        return Err(AppError::InvalidInput(format!(
            "Send at most one '{}' file",
            BRANDING_FIELD
        ))
        .into());
    }
    let image = form.gallery.pop();
    Ok((form, image))
}

#[tracing::instrument(skip_all, fields(client_ip = %admin.client_ip))]
pub async fn update_settings(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<UpdateSettingsRequest>,
) -> Result<Json<Notice<WebsiteSettings>>, HttpAppError> {
    let settings = state.branding.update_content(request).await?;
    Ok(Json(Notice::success("Settings updated", settings)))
}

async fn replace_slot(
    state: &AppState,
    slot: BrandingSlot,
    multipart: Multipart,
) -> Result<Json<Notice<WebsiteSettings>>, HttpAppError> {
    let (_, image) = read_image_form(state, multipart).await?;
    let file = image.ok_or_else(|| {
        AppError::InvalidInput(format!("Send exactly one '{}' file", BRANDING_FIELD))
    })?;

    let outcome = state.branding.replace_slot(slot, file).await?;
    Ok(Json(Notice::from_outcome(
        format!("{} updated", slot.label()),
        outcome,
        "replace_branding",
    )))
}

async fn clear_slot(
    state: &AppState,
    slot: BrandingSlot,
) -> Result<Json<Notice<WebsiteSettings>>, HttpAppError> {
    let outcome = state.branding.clear_slot(slot).await?;
    Ok(Json(Notice::from_outcome(
        format!("{} removed", slot.label()),
        outcome,
        "clear_branding",
    )))
}

#[tracing::instrument(skip_all, fields(client_ip = %admin.client_ip))]
pub async fn replace_logo(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Notice<WebsiteSettings>>, HttpAppError> {
    replace_slot(&state, BrandingSlot::Logo, multipart).await
}

#[tracing::instrument(skip_all, fields(client_ip = %admin.client_ip))]
pub async fn delete_logo(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Notice<WebsiteSettings>>, HttpAppError> {
    clear_slot(&state, BrandingSlot::Logo).await
}

#[tracing::instrument(skip_all, fields(client_ip = %admin.client_ip))]
pub async fn replace_about_image(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<Notice<WebsiteSettings>>, HttpAppError> {
    replace_slot(&state, BrandingSlot::AboutImage, multipart).await
}

#[tracing::instrument(skip_all, fields(client_ip = %admin.client_ip))]
pub async fn delete_about_image(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Notice<WebsiteSettings>>, HttpAppError> {
    clear_slot(&state, BrandingSlot::AboutImage).await
}

/// Every member, inactive ones included, in display order.
#[tracing::instrument(skip_all)]
pub async fn list_team_members(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<TeamMember>>, HttpAppError> {
    let mut members = state.branding.current().await?.team_members;
    members.sort_by_key(|m| m.order);
    Ok(Json(members))
}

#[tracing::instrument(skip_all, fields(client_ip = %admin.client_ip))]
pub async fn add_team_member(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (form, image) = read_image_form(&state, multipart).await?;
    let member = state
        .branding
        .add_team_member(form.team_member_fields()?, image)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Notice::success("Team member added", member)),
    ))
}

#[tracing::instrument(skip_all, fields(member_id = %id, client_ip = %admin.client_ip))]
pub async fn update_team_member(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Notice<TeamMember>>, HttpAppError> {
    let (form, image) = read_image_form(&state, multipart).await?;
    let outcome = state
        .branding
        .update_team_member(id, form.team_member_fields()?, image)
        .await?;
    Ok(Json(Notice::from_outcome(
        "Team member updated",
        outcome,
        "update_team_member",
    )))
}

#[tracing::instrument(skip_all, fields(member_id = %id, client_ip = %admin.client_ip))]
pub async fn delete_team_member(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notice<TeamMember>>, HttpAppError> {
    let outcome = state.branding.delete_team_member(id).await?;
    Ok(Json(Notice::from_outcome(
        "Team member deleted",
        outcome,
        "delete_team_member",
    )))
}
