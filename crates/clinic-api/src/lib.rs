//! # clinic-api
//!
//! REST API layer for the clinic directory: company and doctor resources with
//! optional profile images, plus health and lite-mode file serving.

pub mod attachment;
pub mod auth;
pub mod middleware;
pub mod routes;

use axum::{extract::DefaultBodyLimit, middleware as axum_middleware, Router};
use clinic_common::config::AppConfig;
use clinic_db::{storage::ObjectStore, Database};
use std::sync::Arc;
use std::time::Instant;

/// Shared application state available to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    /// Object storage for profile images (S3/MinIO or local files).
    pub storage: Arc<dyn ObjectStore>,
    /// Configuration loaded at startup; handlers never read it globally.
    pub config: AppConfig,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(db: Database, storage: Arc<dyn ObjectStore>, config: AppConfig) -> Self {
        Self {
            db,
            storage,
            config,
            started_at: Instant::now(),
        }
    }
}

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let state = Arc::new(state);
    let max_body_bytes = state.config.limits.max_body_bytes;

    let protected = Router::new()
        .merge(routes::companies::router())
        .merge(routes::doctors::router())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ));

    let api_routes = Router::new()
        .merge(protected)
        .merge(routes::health::router());

    Router::new()
        .nest("/api/v1", api_routes)
        .merge(routes::files::router())
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(axum_middleware::from_fn(middleware::security_headers))
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::compression::CompressionLayer::new())
        .with_state(state)
}
