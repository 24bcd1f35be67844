/**
 * Announcement Handler
 *
 * This module implements `POST /announce`, which sends one `announce`
 * frame to every open stream of every client.
 *
 * # Event Flow
 *
 * 1. An administrator (see `HubConfig::admins`) posts the announcement text
 * 2. The handler validates it and answers immediately
 * 3. A background task writes the frame to all connections via the
 *    broadcaster, skipping connections that fail
 */

use axum::{extract::State, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::backend::error::BackendError;
use crate::backend::middleware::{Admin, ApiJson};
use crate::backend::realtime::Hub;
use crate::shared::SharedError;

/// Body of `POST /announce`
#[derive(Debug, Deserialize)]
pub struct AnnounceRequest {
    pub announce: String,
}

/// Handle an announcement (POST /announce)
///
/// # Request Body
///
/// JSON object with:
/// - `announce`: String - The text shown to every client
///
/// # Returns
///
/// `{"status":"OK"}` once the broadcast has been started
///
/// # Errors
///
/// * `400 Bad Request` - If the body is not valid JSON or the text is empty
/// * `401 Unauthorized` - If no identity can be resolved
/// * `403 Forbidden` - If the identity is not an administrator
///
/// # Example Request
///
/// ```http
/// POST /announce HTTP/1.1
/// Content-Type: application/json
/// Cookie: userId=admin
///
/// {"announce":"Maintenance at noon"}
/// ```
pub async fn handle_announce(
    State(hub): State<Hub>,
    Admin(identity): Admin,
    ApiJson(request): ApiJson<AnnounceRequest>,
) -> Result<Json<Value>, BackendError> {
    if request.announce.trim().is_empty() {
        return Err(SharedError::validation("announce", "announcement cannot be empty").into());
    }

    tracing::info!("[Chat] {} announced to all clients", identity);
    let broadcaster = hub.broadcaster().clone();
    tokio::spawn(async move {
        if let Err(e) = broadcaster.broadcast(&request.announce).await {
            tracing::warn!("[Chat] Announcement rejected: {}", e);
        }
    });

    Ok(Json(json!({ "status": "OK" })))
}
