//! Request-scoped admin context and response notices.
//!
//! `require_admin` checks the admin key and stores an [`AdminContext`] in the
//! request extensions; handlers take it as an extractor. Mutating admin
//! handlers answer with a [`Notice`].

use std::sync::Arc;

use axum::extract::{FromRequestParts, Request, State};
use axum::http::request::Parts;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Serialize;
use storefront_core::AppError;
use subtle::ConstantTimeEq;

use crate::constants::ADMIN_KEY_HEADER;
use crate::error::HttpAppError;
use crate::services::MediaOutcome;
use crate::state::AppState;
use crate::utils::ip_extraction::extract_client_ip;

/// Who is acting on an admin route.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub client_ip: String,
    pub authenticated_at: DateTime<Utc>,
}

impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AdminContext>()
            .cloned()
            .ok_or_else(|| HttpAppError(AppError::Unauthorized("Admin access required".to_string())))
    }
}

fn secure_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Rejects requests without the admin key header.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let socket_addr = request
        .extensions()
        .get::<axum::extract::ConnectInfo<std::net::SocketAddr>>()
        .map(|info| info.0);
    let client_ip = extract_client_ip(
        request.headers(),
        socket_addr.as_ref(),
        state.security.trusted_proxy_count,
    );

    let presented = request
        .headers()
        .get(ADMIN_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if presented.is_empty() || !secure_compare(presented, &state.security.admin_api_key) {
        tracing::warn!(client_ip = %client_ip, path = %request.uri().path(), "Rejected admin request");
        return HttpAppError(AppError::Unauthorized(
            "Missing or invalid admin key".to_string(),
        ))
        .into_response();
    }

    request.extensions_mut().insert(AdminContext {
        client_ip,
        authenticated_at: Utc::now(),
    });
    next.run(request).await
}

/// Outcome message for admin mutations.
#[derive(Debug, Serialize)]
pub struct Notice<T: Serialize> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl<T: Serialize> Notice<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            warnings: Vec::new(),
        }
    }

    /// Logs the outcome's failed remote deletes and mentions them without detail.
    pub fn from_outcome(
        message: impl Into<String>,
        outcome: MediaOutcome<T>,
        operation: &'static str,
    ) -> Self {
        let leaked = outcome.delete_failures.len();
        let mut notice = Self::success(message, outcome.log_failures(operation));
        if leaked > 0 {
            notice.warnings.push(format!(
                "{} stored file(s) could not be removed and were logged for cleanup",
                leaked
            ));
        }
        notice
    }
}

impl Notice<()> {
    pub fn done(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            warnings: Vec::new(),
        }
    }
}
