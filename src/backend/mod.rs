//! Backend Module
//!
//! This module contains all server-side code: the streaming hub, the
//! producers that feed it and the Axum HTTP surface around both.
//!
//! # Architecture
//!
//! The backend is organized into focused submodules:
//!
//! - **`realtime`** - Streaming hub (sessions, multiplexers, broadcaster)
//! - **`chat`** - Producers and their HTTP handlers
//! - **`auth`** - Identity resolution and JWT tokens
//! - **`middleware`** - `Identity` extractor
//! - **`routes`** - HTTP route configuration and router assembly
//! - **`server`** - Server initialization, application state
//! - **`error`** - Backend-specific error types
//!
//! # Module Structure
//!
//! ```text
//! backend/
//! ├── mod.rs          - Module exports and documentation
//! ├── main.rs         - Server binary
//! ├── realtime/       - Streaming hub
//! ├── chat/           - Producers and handlers
//! ├── auth/           - Identity resolution
//! ├── middleware/     - Request extractors
//! ├── routes/         - Route configuration
//! ├── server/         - Server initialization and state
//! └── error/          - Error types
//! ```
//!
//! # Endpoints
//!
//! - `GET /sse?connectionId=<id>` - Open a stream
//! - `POST /announce` - Announce to every stream
//! - `POST /api/v1/ask` - Ask a question
//! - `POST /api/v1/sql-result` - Stream a query result
//! - `POST /api/v1/stream/text` / `POST /api/v1/stream/raw` - Push chunks
//! - `GET /api/sessions` - Session listing
//! - `GET /health` - Liveness check

/// Streaming hub
pub mod realtime;

/// Producers and chat handlers
pub mod chat;

/// Identity resolution
pub mod auth;

/// Request extractors
pub mod middleware;

/// Route configuration
pub mod routes;

/// Server initialization and state
pub mod server;

/// Backend error types
pub mod error;
