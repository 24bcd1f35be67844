//! ChatHub - Main Library
//!
//! ChatHub is a per-user Server-Sent Events hub. Browser clients keep
//! long-lived streams open; server-side producers (AI answers, query
//! results, announcements) push events into the client's session and the
//! hub multiplexes them onto every stream of that client, keeping idle
//! streams alive with heartbeats.
//!
//! # Module Structure
//!
//! - **`shared`** - Event model, shared errors and configuration
//! - **`backend`** - Streaming hub, producers and the Axum server
//!
//! # Usage
//!
//! ```rust,no_run
//! use chathub::backend::server::create_app;
//! use chathub::shared::HubConfig;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (app, hub) = create_app(HubConfig::default())?;
//! hub.session("alice").push_text("hello");
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! All hub state is shared through `Arc`. Producers never block on a slow
//! client: each session queue is bounded and drops its oldest entry when
//! full.

/// Shared types and configuration
pub mod shared;

/// Backend server-side code
pub mod backend;
