/**
 * Stream Route Handlers
 *
 * This module defines the routes of the streaming surface:
 * - `GET /sse` - Open a Server-Sent Events stream
 * - `POST /announce` - Announce to every open stream
 */

use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::chat::handlers::handle_announce;
use crate::backend::realtime::handle_stream;
use crate::backend::server::state::AppState;

/// Configure stream routes
///
/// # Arguments
///
/// * `router` - The router to add routes to
///
/// # Returns
///
/// Router with stream routes configured
pub fn configure_stream_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/sse", get(handle_stream))
        .route("/announce", post(handle_announce))
}
