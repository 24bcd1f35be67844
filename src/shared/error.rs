//! Shared Error Types
//!
//! Errors raised while building or checking the values that producers hand
//! to the streaming hub.
//!
//! # Error Categories
//!
//! - `ValidationError` - an event or request field failed validation
//!
//! # Usage
//!
//! ```rust
//! use chathub::shared::error::SharedError;
//!
//! let error = SharedError::validation("payload", "payload cannot be empty");
//! ```
use thiserror::Error;

/// Errors produced by the shared data types
#[derive(Debug, Error, Clone)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}
