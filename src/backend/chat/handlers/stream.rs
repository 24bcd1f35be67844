/**
 * Producer Endpoints
 *
 * Thin HTTP entry points that push content into the caller's session
 * through each inbound source:
 *
 * - `POST /api/v1/stream/text` - every body line as a text chunk
 * - `POST /api/v1/stream/raw` - the whole body as one raw chunk
 * - `POST /api/v1/sql-result` - a query result as `sql_table_as_json` frames
 */

use axum::{body::Bytes, extract::State, Json};
use serde_json::{json, Value};

use crate::backend::chat::producers::{stream_result, LINE_PACING};
use crate::backend::error::BackendError;
use crate::backend::middleware::Identity;
use crate::backend::realtime::Hub;
use crate::shared::SharedError;

fn require_body(field: &str, body: &[u8]) -> Result<(), BackendError> {
    if body.is_empty() {
        return Err(SharedError::validation(field, "body cannot be empty").into());
    }
    Ok(())
}

/// Push each line of the body as a text chunk (POST /api/v1/stream/text)
///
/// # Returns
///
/// `{"status":"OK","chunks":<n>}`
pub async fn handle_stream_text(
    State(hub): State<Hub>,
    Identity(identity): Identity,
    body: String,
) -> Result<Json<Value>, BackendError> {
    require_body("text", body.as_bytes())?;
    let session = hub.session(&identity);
    let mut chunks = 0;
    for line in body.lines() {
        session.push_text(line);
        chunks += 1;
    }
    tracing::debug!("[Chat] {} text chunk(s) for {}", chunks, identity);
    Ok(Json(json!({ "status": "OK", "chunks": chunks })))
}

/// Push the body as one raw chunk (POST /api/v1/stream/raw)
///
/// # Returns
///
/// `{"status":"OK","bytes":<n>}`
pub async fn handle_stream_raw(
    State(hub): State<Hub>,
    Identity(identity): Identity,
    body: Bytes,
) -> Result<Json<Value>, BackendError> {
    require_body("raw", &body)?;
    let len = body.len();
    hub.session(&identity).push_raw(body);
    tracing::debug!("[Chat] Raw chunk of {} bytes for {}", len, identity);
    Ok(Json(json!({ "status": "OK", "bytes": len })))
}

/// Stream a query result (POST /api/v1/sql-result)
///
/// The body is the result itself: a JSON document is sent as one frame,
/// other text one frame per line, paced 100 ms apart.
///
/// # Returns
///
/// `{"status":"OK"}` once streaming has been started
pub async fn handle_sql_result(
    State(hub): State<Hub>,
    Identity(identity): Identity,
    body: String,
) -> Result<Json<Value>, BackendError> {
    require_body("data", body.as_bytes())?;
    let session = hub.session(&identity);
    tokio::spawn(async move {
        if let Err(e) = stream_result(&session, &body, LINE_PACING).await {
            tracing::warn!("[Chat] Result for {} not sent: {}", session.identity_key(), e);
        }
    });
    Ok(Json(json!({ "status": "OK" })))
}
