//! API Routes
//!
//! Configures the Axum router with all smash cache admin endpoints.

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    exists_handler, find_handler, health_handler, smash_handler, smash_namespace_handler,
    smash_pattern_handler, smash_tag_handler, stats_handler, store_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `PUT /cache` - Add or replace a value, optionally tagged
/// - `GET /cache?key=` - Look up a value
/// - `DELETE /cache?key=&wide_net_flush=` - Smash a key
/// - `GET /exists?key=` - Check for a live entry
/// - `DELETE /tags?tag=` - Smash every key under a tag
/// - `DELETE /pattern?prefix=` - Smash every key starting with a prefix
/// - `DELETE /namespace?namespace=` - Smash a whole namespace
/// - `GET /stats` - Counter snapshot
/// - `GET /health` - Health check endpoint
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/cache",
            get(find_handler).put(store_handler).delete(smash_handler),
        )
        .route("/exists", get(exists_handler))
        .route("/tags", delete(smash_tag_handler))
        .route("/pattern", delete(smash_pattern_handler))
        .route("/namespace", delete(smash_namespace_handler))
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
