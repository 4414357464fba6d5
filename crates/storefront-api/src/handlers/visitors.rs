use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use std::net::SocketAddr;
use std::sync::Arc;
use storefront_core::models::{CreateVisitorRequest, Visitor};
use uuid::Uuid;

use crate::context::{AdminContext, Notice};
use crate::error::{HttpAppError, ValidatedJson};
use crate::state::AppState;
use crate::utils::ip_extraction::extract_client_ip;

/// Records a landing-page preference along with where it came from.
#[tracing::instrument(skip_all, fields(preference = %request.preference))]
pub async fn save_visitor(
    State(state): State<Arc<AppState>>,
    connect_info: Option<Extension<ConnectInfo<SocketAddr>>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<CreateVisitorRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let socket_addr = connect_info.map(|Extension(ConnectInfo(addr))| addr);
    let ip = extract_client_ip(
        &headers,
        socket_addr.as_ref(),
        state.security.trusted_proxy_count,
    );
    let ip_address = (ip != "unknown").then_some(ip);
    let user_agent = headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(500).collect::<String>());

    let visitor = state
        .repositories
        .visitors
        .create(Visitor::new(request, ip_address, user_agent))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(Notice::success("Preference saved", visitor)),
    ))
}

#[tracing::instrument(skip_all)]
pub async fn list_visitors(
    _admin: AdminContext,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Visitor>>, HttpAppError> {
    Ok(Json(state.repositories.visitors.list().await?))
}

#[tracing::instrument(skip_all, fields(visitor_id = %id, client_ip = %admin.client_ip))]
pub async fn delete_visitor(
    admin: AdminContext,
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Notice<()>>, HttpAppError> {
    state.repositories.visitors.delete(id).await?;
    Ok(Json(Notice::done("Visitor deleted")))
}
