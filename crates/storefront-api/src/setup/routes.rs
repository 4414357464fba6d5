//! Route configuration and setup

use crate::constants::{API_PREFIX, LOCAL_MEDIA_ROUTE, MULTIPART_OVERHEAD_BYTES};
use crate::context::require_admin;
use crate::handlers::{
    catalog_admin, catalog_public, dashboard, health, inquiries, settings, visitors,
};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{AssetStoreBackend, Config};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Setup all application routes
pub fn setup_routes(config: &Config, state: Arc<AppState>) -> Result<Router<()>, anyhow::Error> {
    let cors = setup_cors(config)?;

    let admin = admin_routes().route_layer(axum::middleware::from_fn_with_state(
        state.clone(),
        require_admin,
    ));
    let api = public_routes().merge(admin);

    let mut app = Router::new()
        .route("/health", get(health::health_check))
        .nest(API_PREFIX, api);

    if config.asset_store_backend() == AssetStoreBackend::Local {
        if let Some(path) = config.local_storage_path() {
            tracing::info!(path = %path, route = LOCAL_MEDIA_ROUTE, "Serving local media");
            app = app.nest_service(LOCAL_MEDIA_ROUTE, ServeDir::new(path));
        }
    }

    let http_concurrency_limit = config.http_concurrency_limit().max(1);
    let upload_timeout = Duration::from_secs(config.upload_timeout_secs().max(1));
    tracing::info!(
        http_concurrency_limit,
        upload_timeout_secs = upload_timeout.as_secs(),
        "HTTP limits enabled"
    );

    let app = app
        .layer(TimeoutLayer::new(upload_timeout))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(RequestBodyLimitLayer::new(
            config.max_upload_bytes() + MULTIPART_OVERHEAD_BYTES,
        ))
        .layer(DefaultBodyLimit::disable())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];
    let cors = if config.cors_origins().iter().any(|o| o == "*") {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        let origins = config
            .cors_origins()
            .iter()
            .map(|o| o.parse::<HeaderValue>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?;
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
    };
    Ok(cors)
}

fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/catalog/{kind}", get(catalog_public::list_catalog))
        .route("/catalog/{kind}/slug/{slug}", get(catalog_public::get_by_slug))
        .route("/inquiries", post(inquiries::submit_inquiry))
        .route("/visitors", post(visitors::save_visitor))
        .route("/settings", get(settings::get_settings))
}

fn admin_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/admin/dashboard", get(dashboard::show_dashboard))
        .route(
            "/admin/catalog/{kind}",
            get(catalog_admin::list_entries).post(catalog_admin::create_entry),
        )
        .route(
            "/admin/catalog/{kind}/{id}",
            get(catalog_admin::get_entry)
                .post(catalog_admin::update_entry)
                .delete(catalog_admin::delete_entry),
        )
        .route(
            "/admin/catalog/{kind}/{id}/featured",
            put(catalog_admin::replace_featured),
        )
        .route(
            "/admin/catalog/{kind}/{id}/gallery",
            post(catalog_admin::append_gallery),
        )
        .route(
            "/admin/catalog/{kind}/{id}/gallery/{item_id}",
            axum::routing::delete(catalog_admin::remove_gallery_item),
        )
        .route(
            "/admin/catalog/{kind}/{id}/toggle",
            post(catalog_admin::toggle_visibility),
        )
        .route("/admin/inquiries", get(inquiries::list_inquiries))
        .route(
            "/admin/inquiries/{id}",
            get(inquiries::get_inquiry).delete(inquiries::delete_inquiry),
        )
        .route(
            "/admin/inquiries/{id}/status",
            post(inquiries::update_inquiry_status),
        )
        .route("/admin/visitors", get(visitors::list_visitors))
        .route(
            "/admin/visitors/{id}",
            axum::routing::delete(visitors::delete_visitor),
        )
        .route("/admin/settings", put(settings::update_settings))
        .route(
            "/admin/settings/logo",
            put(settings::replace_logo).delete(settings::delete_logo),
        )
        .route(
            "/admin/settings/about-image",
            put(settings::replace_about_image).delete(settings::delete_about_image),
        )
        .route(
            "/admin/settings/team",
            get(settings::list_team_members).post(settings::add_team_member),
        )
        .route(
            "/admin/settings/team/{id}",
            post(settings::update_team_member).delete(settings::delete_team_member),
        )
}
