//! Chat Backend Module
//!
//! Producers that feed the streaming hub on behalf of the chat UI:
//!
//! - **`answers`** - AI answer streaming (`AnswerSource`, `stream_answer`)
//! - **`producers`** - Chunked query-result streaming
//! - **`handlers`** - HTTP endpoints that start producers
//!
//! # Example
//!
//! ```rust,no_run
//! use chathub::backend::chat::answers::{stream_answer, EchoAnswers};
//! use chathub::backend::realtime::Session;
//!
//! # async fn example() {
//! let session = Session::new("alice", 256);
//! let lines = stream_answer(&session, &EchoAnswers::default(), "hi?", "tab-1").await;
//! # }
//! ```

/// AI answer producer
pub mod answers;

/// Chunked result producer
pub mod producers;

/// HTTP handlers
pub mod handlers;
