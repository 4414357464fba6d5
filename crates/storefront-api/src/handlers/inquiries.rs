//! Customer inquiries: public submission, admin follow-up.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use storefront_core::models::{
    CreateInquiryRequest, Inquiry, InquiryFilter, UpdateInquiryStatusRequest,
};
use storefront_core::AppError;
use uuid::Uuid;

use crate::context::{AdminContext, Notice};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;

/// The product title is copied onto the inquiry so it survives later renames
/// or deletion of the product.
async fn resolve_product_title(
    state: &AppState,
    request: &CreateInquiryRequest,
) -> Result<Option<String>, AppError> {
    let (Some(product_id), Some(kind)) = (request.product_id, request.product_type.catalog_kind())
    else {
        return Ok(None);
    };

    match state.repositories.catalog.get(kind, product_id).await {
        Ok(entity) => Ok(Some(entity.title)),
        Err(AppError::NotFound(_)) => {
            tracing::warn!(product_id = %product_id, kind = %kind, "Inquiry references unknown product");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

#[tracing::instrument(skip_all, fields(product_type = %request.product_type))]
pub async fn submit_inquiry(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateInquiryRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let product_title = resolve_product_title(&state, &request).await?;
    let inquiry = state
        .repositories
        .inquiries
        .create(Inquiry::new(request, product_title))
        .await?;

    tracing::info!(inquiry_id = %inquiry.id, "Inquiry received");
    Ok((
        StatusCode::CREATED,
        Json(Notice::success(
            "Thank you! We will get back to you soon.",
            inquiry,
        )),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn list_inquiries(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Query(filter): Query<InquiryFilter>,
) -> Result<Json<Vec<Inquiry>>, HttpAppError> {
    let inquiries = state.repositories.inquiries.list(&filter).await?;
    Ok(Json(inquiries))
}

#[tracing::instrument(skip_all, fields(inquiry_id = %id))]
pub async fn get_inquiry(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Inquiry>, HttpAppError> {
    let inquiry = state.repositories.inquiries.get(id).await?;
    Ok(Json(inquiry))
}

#[tracing::instrument(skip_all, fields(inquiry_id = %id, client_ip = %admin.client_ip))]
pub async fn update_inquiry_status(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateInquiryStatusRequest>,
) -> Result<Json<Notice<Inquiry>>, HttpAppError> {
    let inquiry = state
        .repositories
        .inquiries
        .update_status(id, request.status, request.admin_notes)
        .await?;
    Ok(Json(Notice::success(
        format!("Inquiry marked as {}", inquiry.status),
        inquiry,
    )))
}

#[tracing::instrument(skip_all, fields(inquiry_id = %id, client_ip = %admin.client_ip))]
pub async fn delete_inquiry(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notice<()>>, HttpAppError> {
    state.repositories.inquiries.delete(id).await?;
    Ok(Json(Notice::done("Inquiry deleted")))
}
