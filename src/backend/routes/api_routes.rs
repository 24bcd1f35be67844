/**
 * API Route Handlers
 *
 * This module defines the producer and inspection endpoints:
 *
 * ## Producers
 * - `POST /api/v1/ask` - Ask a question, answer streamed to the asker
 * - `POST /api/v1/sql-result` - Stream a query result
 * - `POST /api/v1/stream/text` - Push text chunks
 * - `POST /api/v1/stream/raw` - Push a raw chunk
 *
 * ## Inspection
 * - `GET /api/sessions` - List sessions and their connections
 */

use axum::{
    routing::{get, post},
    Router,
};

use crate::backend::chat::handlers::{
    handle_ask, handle_list_sessions, handle_sql_result, handle_stream_raw, handle_stream_text,
};
use crate::backend::server::state::AppState;

/// Configure API routes
///
/// Producer routes require an identity (checked by the `Identity`
/// extractor in each handler); the session listing is public.
pub fn configure_api_routes(router: Router<AppState>) -> Router<AppState> {
    router
        .route("/api/v1/ask", post(handle_ask))
        .route("/api/v1/sql-result", post(handle_sql_result))
        .route("/api/v1/stream/text", post(handle_stream_text))
        .route("/api/v1/stream/raw", post(handle_stream_raw))
        .route("/api/sessions", get(handle_list_sessions))
}
