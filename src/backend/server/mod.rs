//! Server Module
//!
//! This module contains all server-side code for initializing and configuring
//! the Axum HTTP server.
//!
//! # Architecture
//!
//! - **`state`** - Application state structure and `FromRef` implementations
//! - **`config`** - Collaborators derived from `HubConfig`
//! - **`init`** - Server initialization and app creation
//!
//! # Module Structure
//!
//! ```text
//! server/
//! ├── mod.rs          - Module exports and documentation
//! ├── state.rs        - AppState and FromRef implementations
//! ├── config.rs       - Identity resolver selection
//! └── init.rs         - Server initialization and app creation
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use chathub::backend::server::create_app;
//! use chathub::shared::HubConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (app, hub) = create_app(HubConfig::load()?)?;
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:5555").await?;
//! axum::serve(listener, app)
//!     .with_graceful_shutdown(async move { hub.shutdown_token().cancelled().await })
//!     .await?;
//! # Ok(())
//! # }
//! ```

/// Application state and FromRef implementations
pub mod state;

/// Configuration-derived collaborators
pub mod config;

/// Server initialization
pub mod init;

pub use init::{create_app, create_app_with};
pub use state::AppState;
