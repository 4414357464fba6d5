use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use std::time::Duration;

use crate::state::AppState;

/// Liveness plus a bounded settings read, which touches the repository.
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    const TIMEOUT: Duration = Duration::from_secs(5);

    let repository = match tokio::time::timeout(TIMEOUT, state.repositories.settings.get_or_create()).await {
        Ok(Ok(_)) => "healthy".to_string(),
        Ok(Err(e)) => {
            tracing::error!(error = %e, "Repository health check failed");
            "unhealthy".to_string()
        }
        Err(_) => "timeout".to_string(),
    };

    let healthy = repository == "healthy";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(serde_json::json!({
            "status": if healthy { "healthy" } else { "degraded" },
            "repository": repository,
            "asset_store": state.store.backend_type().to_string(),
        })),
    )
}
