use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::SharedState;

mod admin;
pub mod auth;
mod avatars;
mod credits;
mod error;
mod generate;
mod observability;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: crate::config::Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = state.shared.config.server.cors_allowed_origins.clone();

    // Product surface: requires the authorization gate on top of identity.
    let product_routes = Router::new()
        .route("/generate", post(generate::generate_avatar))
        .route("/avatars", get(avatars::list_avatars))
        .route("/avatars/{id}", get(avatars::get_avatar))
        .route("/avatars/{id}", put(avatars::update_avatar))
        .route("/avatars/{id}", delete(avatars::delete_avatar))
        .route("/avatars/{id}/image", post(generate::regenerate_image))
        .route(
            "/avatars/{id}/sections/{section}",
            post(generate::generate_section),
        )
        .route("/credits", get(credits::get_balance))
        .route("/credits/history", get(credits::get_history))
        .route_layer(middleware::from_fn(auth::gate_middleware));

    // Admin surface: admin flag required; the services check again.
    let admin_routes = Router::new()
        .route("/accounts", get(admin::list_accounts))
        .route("/accounts/bulk", post(admin::bulk_create))
        .route("/accounts/import", post(admin::import_accounts))
        .route("/accounts/{id}/credits", put(admin::adjust_credits))
        .route(
            "/accounts/{id}/credits/history",
            get(admin::credit_history),
        )
        .route("/accounts/{id}/active", put(admin::set_active))
        .route(
            "/accounts/{id}/authenticated",
            put(admin::set_authenticated),
        )
        .route("/accounts/{id}/admin", put(admin::set_admin))
        .route("/accounts/{id}", delete(admin::delete_account))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn(auth::admin_middleware));

    let authenticated = Router::new()
        .route("/me", get(auth::get_me))
        .merge(product_routes)
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::identity_middleware,
        ));

    let api_router = Router::new()
        .merge(authenticated)
        .route("/health", get(observability::get_health))
        .with_state(state);

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
