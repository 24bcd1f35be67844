//! Chat Handlers Module
//!
//! This module contains the Axum handlers that feed the streaming hub.
//!
//! # Architecture
//!
//! - **`announce`** - Announcement to every client (POST /announce)
//! - **`ask`** - AI answers streamed to the asker (POST /api/v1/ask)
//! - **`stream`** - Text, raw and result producers (POST /api/v1/...)
//! - **`sessions`** - Session listing (GET /api/sessions)
//!
//! # Module Structure
//!
//! ```text
//! handlers/
//! ├── mod.rs       - Module exports and documentation
//! ├── announce.rs  - Announcement handler
//! ├── ask.rs       - Ask handler
//! ├── stream.rs    - Producer endpoints
//! └── sessions.rs  - Session listing
//! ```
//!
//! All producer endpoints answer immediately; their output reaches the
//! client on its open `GET /sse` streams.

/// Announcement handler
pub mod announce;

/// Ask handler
pub mod ask;

/// Producer endpoints
pub mod stream;

/// Session listing
pub mod sessions;

pub use announce::handle_announce;
pub use ask::handle_ask;
pub use sessions::handle_list_sessions;
pub use stream::{handle_sql_result, handle_stream_raw, handle_stream_text};
