//! Route Configuration Module
//!
//! This module configures all HTTP routes for the backend server.
//!
//! # Architecture
//!
//! - **`router`** - Main router creation and route assembly
//! - **`stream_routes`** - Streaming endpoints (`/sse`, `/announce`)
//! - **`api_routes`** - Producer and inspection endpoints
//!
//! # Module Structure
//!
//! ```text
//! routes/
//! ├── mod.rs           - Module exports and documentation
//! ├── router.rs        - Main router creation
//! ├── stream_routes.rs - Streaming routes
//! └── api_routes.rs    - API routes
//! ```

/// Main router creation
pub mod router;

/// Streaming routes
pub mod stream_routes;

/// API routes
pub mod api_routes;

pub use router::create_router;
