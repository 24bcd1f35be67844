//! Shared Module
//!
//! Types used by producers, the streaming hub and the HTTP layer alike:
//! the event model, shared error types and configuration.

/// Real-time event model
pub mod event;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use event::{EventKind, Inbound, StructuredEvent};
pub use error::SharedError;
pub use config::{AuthMode, ConfigError, HubConfig, HubConfigBuilder};
