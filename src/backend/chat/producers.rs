//! Chunked result producer
//!
//! Streams a query result to a session as `sql_table_as_json` frames. A
//! payload that is valid JSON goes out as one frame; anything else is sent
//! line by line so the client can render it progressively.

use std::time::Duration;

use crate::backend::realtime::frame::render_event;
use crate::backend::realtime::Session;
use crate::shared::{EventKind, SharedError, StructuredEvent};

/// Id of the single frame carrying a JSON result
pub const JSON_RESULT_ID: &str = "32332";

/// Reconnection hint attached to every result frame
pub const RESULT_RETRY_MILLIS: u32 = 3000;

/// Pause between line frames
pub const LINE_PACING: Duration = Duration::from_millis(100);

/// Render the frames for `data`, in send order
pub fn result_frames(data: &str) -> Result<Vec<String>, SharedError> {
    if serde_json::from_str::<serde::de::IgnoredAny>(data).is_ok() {
        // raw newlines in valid JSON are insignificant whitespace
        let compact: String = data.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        let event = StructuredEvent::new(EventKind::SqlResult, compact)
            .with_id(JSON_RESULT_ID)
            .with_retry(RESULT_RETRY_MILLIS);
        return Ok(vec![render_event(&event)?]);
    }

    data.split('\n')
        .enumerate()
        .map(|(index, line)| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            let event = StructuredEvent::new(EventKind::SqlResult, format!("{} ", line))
                .with_id(index.to_string())
                .with_retry(RESULT_RETRY_MILLIS);
            render_event(&event)
        })
        .collect()
}

/// Publish `data` into `session` as preformatted result frames
///
/// # Returns
///
/// Number of frames published.
pub async fn stream_result(
    session: &Session,
    data: &str,
    pacing: Duration,
) -> Result<usize, SharedError> {
    let frames = result_frames(data)?;
    let total = frames.len();
    tracing::info!(
        "[Chat] Streaming result to {} in {} frame(s)",
        session.identity_key(),
        total
    );

    for (index, frame) in frames.into_iter().enumerate() {
        if index > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }
        session.push_preformatted(frame);
    }
    Ok(total)
}
