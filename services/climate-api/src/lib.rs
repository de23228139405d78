//! Climate API Service Library
//!
//! HTTP backend serving subsets of a gridded near-surface temperature
//! dataset to a map front end, plus GeoTIFF and PDF exports.

pub mod config;
pub mod download;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod schema;
pub mod state;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, services::ServeDir, trace::TraceLayer,
};

use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_dir = state.config.frontend.static_dir.clone();

    Router::new()
        // Front end
        .route("/", get(handlers::index::index_handler))
        .nest_service("/static", ServeDir::new(static_dir))
        // Data API
        .route("/api/data", get(handlers::data::data_handler))
        .route(
            "/api/clear-cache",
            post(handlers::cache::clear_cache_handler),
        )
        .route(
            "/api/download-geotiff",
            post(handlers::export::download_geotiff_handler),
        )
        .route(
            "/api/download-pdf",
            post(handlers::export::download_pdf_handler),
        )
        // Health and metrics
        .route("/health", get(handlers::health::health_handler))
        .route("/ready", get(handlers::health::ready_handler))
        .route("/metrics", get(handlers::health::metrics_handler))
        // Middleware
        .layer(Extension(state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
}
