//! Back-office dashboard figures.

use axum::{extract::State, Json};
use std::sync::Arc;
use storefront_core::models::DashboardStats;

use crate::constants::RECENT_INQUIRY_LIMIT;
use crate::context::AdminContext;
use crate::error::HttpAppError;
use crate::state::AppState;

#[tracing::instrument(skip_all)]
pub async fn show_dashboard(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<DashboardStats>, HttpAppError> {
    let repos = &state.repositories;
    let (catalog, inquiries, recent_inquiries) = tokio::try_join!(
        repos.catalog.count_by_kind(),
        repos.inquiries.count_by_status(),
        repos.inquiries.recent(RECENT_INQUIRY_LIMIT),
    )?;

    Ok(Json(DashboardStats {
        catalog,
        inquiries,
        recent_inquiries,
    }))
}
