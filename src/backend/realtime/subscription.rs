/**
 * Stream Subscription Handler
 *
 * This module implements the `GET /sse` endpoint that opens a long-lived
 * Server-Sent Events stream for the calling client.
 *
 * # Connection Management
 *
 * - The client identity selects the session (see `auth::identity`)
 * - `connectionId` names the stream inside the session; reusing an id
 *   replaces the previous stream
 * - The response body is fed from an in-memory pipe written by the
 *   stream's multiplexer, so frames reach the client byte for byte
 * - Keep-alive is the hub's own heartbeat frame, not an SSE comment
 */

use axum::{
    body::Body,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;

use crate::backend::middleware::Identity;
use crate::backend::realtime::{sink, Hub};

/// Query parameters of `GET /sse`
#[derive(Debug, Default, Deserialize)]
pub struct StreamParams {
    /// Client-chosen stream id, empty when absent
    #[serde(default, rename = "connectionId")]
    pub connection_id: String,
}

/// Open a stream (GET /sse)
///
/// # Query Parameters
///
/// - `connectionId` - Stream id within the client's session (optional)
///
/// # Returns
///
/// `200 OK` with a `text/event-stream` body that stays open until the
/// stream is replaced, the client goes away or the server shuts down.
///
/// # Errors
///
/// * `401 Unauthorized` - If no identity can be resolved
///
/// # Example Response
///
/// ```http
/// HTTP/1.1 200 OK
/// Content-Type: text/event-stream
/// Cache-Control: no-cache
/// Connection: keep-alive
///
/// id: 1718000000000000000
/// event: info
/// data: hello
///
/// data: Cycle: 1, Time: 2024-06-10T08:00:02Z
///
/// ```
pub async fn handle_stream(
    State(hub): State<Hub>,
    Identity(identity): Identity,
    Query(params): Query<StreamParams>,
) -> Response {
    tracing::info!(
        "[Realtime] Stream request from {} (connectionId '{}')",
        identity,
        params.connection_id
    );

    let (sink, reader) = sink::pipe();
    // the task is detached; it deregisters itself when the stream ends
    let _ = hub.open_stream(&identity, &params.connection_id, sink).await;

    (
        [
            (header::CONTENT_TYPE, "text/event-stream"),
            (header::CACHE_CONTROL, "no-cache"),
            (header::CONNECTION, "keep-alive"),
        ],
        Body::from_stream(ReaderStream::new(reader)),
    )
        .into_response()
}
