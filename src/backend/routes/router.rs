/**
 * Router Configuration
 *
 * This module provides the main router creation function that combines
 * all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. Stream routes (`/sse`, `/announce`)
 * 2. API routes (producers, session listing)
 * 3. Health check
 * 4. Fallback handler (404)
 *
 * Every request passes through `tower-http`'s `TraceLayer`.
 */

use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::routes::stream_routes::configure_stream_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Arguments
///
/// * `app_state` - Application state containing the hub and collaborators
///
/// # Returns
///
/// Configured Axum Router ready to serve requests
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = configure_stream_routes(Router::new());
    let router = configure_api_routes(router);

    router
        .route("/health", get(health))
        .fallback(|| async { (StatusCode::NOT_FOUND, "404 Not Found") })
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Liveness check (GET /health)
async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
