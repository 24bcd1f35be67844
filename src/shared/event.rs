/**
 * Real-time Event Model
 *
 * This module defines the values that travel through a session's inbound
 * queue: typed structured events, raw byte chunks, plain text chunks and
 * frames that a producer already rendered in wire syntax.
 *
 * # Event Kinds
 *
 * Every kind has a fixed wire name used on the `event:` line:
 * - `Null` - `""` (heartbeat frames only)
 * - `ChatResponse` - `chatgpt_response`
 * - `Info` - `info`
 * - `Announce` - `announce`
 * - `SqlResult` - `sql_table_as_json`
 */
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::shared::SharedError;

/// Type of a real-time event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Untyped keep-alive, never valid for a structured event
    #[serde(rename = "")]
    Null,
    /// Fragment of an AI answer
    #[serde(rename = "chatgpt_response")]
    ChatResponse,
    /// Informational notice
    #[serde(rename = "info")]
    Info,
    /// Administrative announcement sent to everyone
    #[serde(rename = "announce")]
    Announce,
    /// Tabular query result serialized as JSON
    #[serde(rename = "sql_table_as_json")]
    SqlResult,
}

impl EventKind {
    /// Name written on the `event:` line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "",
            Self::ChatResponse => "chatgpt_response",
            Self::Info => "info",
            Self::Announce => "announce",
            Self::SqlResult => "sql_table_as_json",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed event pushed by a producer into a session
///
/// An empty `id` is replaced with the current nanosecond timestamp when the
/// event is rendered. `retry_hint_millis == 0` omits the `retry:` line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StructuredEvent {
    /// Event id, may be empty
    #[serde(default)]
    pub id: String,
    /// Event type
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Data line content, written verbatim
    pub payload: String,
    /// Client reconnection hint in milliseconds
    #[serde(default, rename = "retry")]
    pub retry_hint_millis: u32,
    /// Browser tab the event belongs to
    #[serde(default)]
    pub tab_id: String,
}

impl StructuredEvent {
    /// Create an event with an empty id and no retry hint
    pub fn new(kind: EventKind, payload: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            kind,
            payload: payload.into(),
            retry_hint_millis: 0,
            tab_id: String::new(),
        }
    }

    /// Create an `info` event
    pub fn info(payload: impl Into<String>) -> Self {
        Self::new(EventKind::Info, payload)
    }

    /// Create a `chatgpt_response` event for a browser tab
    pub fn chat_response(payload: impl Into<String>, tab_id: impl Into<String>) -> Self {
        Self::new(EventKind::ChatResponse, payload).with_tab_id(tab_id)
    }

    /// Create an `announce` event
    pub fn announce(payload: impl Into<String>) -> Self {
        Self::new(EventKind::Announce, payload)
    }

    /// Set the event id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the retry hint
    pub fn with_retry(mut self, retry_hint_millis: u32) -> Self {
        self.retry_hint_millis = retry_hint_millis;
        self
    }

    /// Set the tab id
    pub fn with_tab_id(mut self, tab_id: impl Into<String>) -> Self {
        self.tab_id = tab_id.into();
        self
    }

    /// Check the event can be rendered as a frame
    ///
    /// Fails for the `Null` kind and for an empty payload.
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.kind == EventKind::Null {
            return Err(SharedError::validation(
                "type",
                "structured events require a non-null type",
            ));
        }
        if self.payload.is_empty() {
            return Err(SharedError::validation("payload", "payload cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Display for StructuredEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "StructuredEvent{{id: {}, type: {}, payload: {}, retry: {}, tab: {}}}",
            self.id, self.kind, self.payload, self.retry_hint_millis, self.tab_id
        )
    }
}

/// One message waiting in a session's inbound queue
///
/// All producers of a session share a single queue of this type, so the
/// order in which they publish is the order in which connections see it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// Typed event rendered with id/event/data/retry lines
    Structured(StructuredEvent),
    /// Raw byte chunk rendered as a `chatgpt_response` chunk
    Raw(Bytes),
    /// Text chunk rendered as a `chatgpt_response` chunk
    Text(String),
    /// Frame already in wire syntax, written verbatim
    Preformatted(String),
}

impl Inbound {
    /// Short name of the source, used in logs
    pub fn source(&self) -> &'static str {
        match self {
            Self::Structured(_) => "structured",
            Self::Raw(_) => "raw",
            Self::Text(_) => "text",
            Self::Preformatted(_) => "preformatted",
        }
    }
}

impl From<StructuredEvent> for Inbound {
    fn from(event: StructuredEvent) -> Self {
        Self::Structured(event)
    }
}
