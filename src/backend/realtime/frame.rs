/**
 * SSE Frame Rendering and Writing
 *
 * Every message leaves the server as one complete frame terminated by a
 * blank line. The byte layout is fixed:
 *
 * ```text
 * id: <id>\nevent: <type>\ndata: <payload>\nretry: <ms>\n\n   structured, retry > 0
 * id: <id>\nevent: <type>\ndata: <payload>\n\n                structured, retry = 0
 * event: chatgpt_response\ndata: <escaped>\n\n                 raw and text chunks
 * data: <escaped>\n\n                                          heartbeat
 * ```
 *
 * Structured payloads are written verbatim. Chunk and heartbeat payloads
 * are JSON-string escaped with the surrounding quotes removed, so embedded
 * newlines can never split a frame.
 *
 * `FrameWriter` stages frames and flushes them through the retry executor.
 */

use chrono::{DateTime, SecondsFormat, Utc};
use std::borrow::Cow;
use std::io;

use crate::backend::error::HubError;
use crate::backend::realtime::retry::{retry_with, RetryPolicy};
use crate::backend::realtime::sink::ConnectionSink;
use crate::shared::{EventKind, Inbound, SharedError, StructuredEvent};

/// JSON-escape `text` and drop one leading and one trailing quote
pub fn escape_payload(text: &str) -> String {
    let quoted = serde_json::Value::String(text.to_owned()).to_string();
    let unquoted = quoted.strip_prefix('"').unwrap_or(&quoted);
    unquoted.strip_suffix('"').unwrap_or(unquoted).to_string()
}

/// Render a structured event
///
/// Fails for events that do not validate. An empty id becomes the current
/// time in nanoseconds.
pub fn render_event(event: &StructuredEvent) -> Result<String, SharedError> {
    event.validate()?;
    let id: Cow<'_, str> = if event.id.is_empty() {
        Cow::Owned(default_event_id())
    } else {
        Cow::Borrowed(&event.id)
    };
    let frame = if event.retry_hint_millis > 0 {
        format!(
            "id: {}\nevent: {}\ndata: {}\nretry: {}\n\n",
            id, event.kind, event.payload, event.retry_hint_millis
        )
    } else {
        format!("id: {}\nevent: {}\ndata: {}\n\n", id, event.kind, event.payload)
    };
    Ok(frame)
}

/// Render a chunk frame for a raw or text fragment
pub fn render_chunk(kind: EventKind, text: &str) -> String {
    format!("event: {}\ndata: {}\n\n", kind, escape_payload(text))
}

/// Render the keep-alive frame for loop iteration `cycle`
pub fn render_heartbeat(cycle: u64, now: DateTime<Utc>) -> String {
    let line = format!(
        "Cycle: {}, Time: {}",
        cycle,
        now.to_rfc3339_opts(SecondsFormat::Secs, true)
    );
    format!("data: {}\n\n", escape_payload(&line))
}

/// Render any inbound message
pub fn render_inbound(message: &Inbound) -> Result<Cow<'_, str>, SharedError> {
    match message {
        Inbound::Structured(event) => render_event(event).map(Cow::Owned),
        Inbound::Raw(bytes) => Ok(Cow::Owned(render_chunk(
            EventKind::ChatResponse,
            &String::from_utf8_lossy(bytes),
        ))),
        Inbound::Text(text) => Ok(Cow::Owned(render_chunk(EventKind::ChatResponse, text))),
        Inbound::Preformatted(frame) => Ok(Cow::Borrowed(frame)),
    }
}

fn default_event_id() -> String {
    let now = Utc::now();
    now.timestamp_nanos_opt()
        .unwrap_or_else(|| now.timestamp_micros())
        .to_string()
}

/// Writes frames to a sink under a retry policy
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameWriter {
    policy: RetryPolicy,
}

impl FrameWriter {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Stage one frame
    ///
    /// A full buffer only drains by flushing, so a refused frame triggers a
    /// flush (retried with backoff) and is then staged into the empty
    /// buffer. Staging itself is never retried.
    pub async fn write(&self, sink: &mut ConnectionSink, frame: &str) -> Result<(), HubError> {
        match sink.write_frame(frame.as_bytes()) {
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                tracing::debug!("[Hub] {}, flushing before staging", e);
                self.flush(sink).await?;
                sink.write_frame(frame.as_bytes()).map_err(HubError::staging)
            }
            staged => staged.map_err(HubError::staging),
        }
    }

    /// Flush staged frames, retrying with backoff
    pub async fn flush(&self, sink: &mut ConnectionSink) -> Result<(), HubError> {
        retry_with(self.policy, sink, |sink| Box::pin(sink.flush()))
            .await
            .map_err(HubError::flush)
    }

    /// Stage and flush one frame
    pub async fn send(&self, sink: &mut ConnectionSink, frame: &str) -> Result<(), HubError> {
        self.write(sink, frame).await?;
        self.flush(sink).await
    }
}
