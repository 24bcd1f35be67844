/**
 * Backend Error Types
 *
 * This module defines error types specific to the backend server.
 * These errors are used in HTTP handlers and the streaming hub, and the
 * handler-facing ones can be converted to HTTP responses.
 *
 * # Error Types
 *
 * - `BackendError` - Errors returned from HTTP handlers
 * - `HubError` - Errors raised while writing frames to a client stream
 *
 * # Error Categories
 *
 * ## Handler Errors
 *
 * Handler errors occur when processing HTTP requests:
 * - Missing required fields
 * - Invalid request format
 * - Unresolvable client identity
 * - An identity without administrative rights
 *
 * ## Hub Errors
 *
 * Hub errors end the connection they occur on:
 * - A frame could not be staged
 * - A flush could not be completed after the retry budget
 */

use thiserror::Error;
use axum::http::StatusCode;
use crate::backend::realtime::retry::RetryError;
use crate::shared::SharedError;

/// Backend-specific error types
///
/// Each variant includes relevant context and can be converted to an HTTP response.
///
/// # Usage
///
/// ```rust
/// use chathub::backend::error::BackendError;
/// use axum::http::StatusCode;
///
/// // Create a handler error
/// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
///
/// // Create an authentication error
/// let err = BackendError::unauthorized("missing userId cookie");
///
/// // Create an authorization error
/// let err = BackendError::forbidden("mallory may not announce");
/// ```
#[derive(Debug, Error)]
pub enum BackendError {
    /// Handler error (e.g., a request body that cannot be parsed)
    #[error("Handler error: {message}")]
    HandlerError {
        /// HTTP status code for this error
        status: StatusCode,
        /// Human-readable error message
        message: String,
    },

    /// The request carries no usable identity
    #[error("Unauthorized: {message}")]
    Unauthorized {
        /// Human-readable error message
        message: String,
    },

    /// The identity is known but not allowed to do this
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Human-readable error message
        message: String,
    },

    /// Shared error (from shared module)
    #[error(transparent)]
    SharedError(#[from] SharedError),
}

impl BackendError {
    /// Create a new handler error with a status code
    ///
    /// # Example
    ///
    /// ```rust
    /// use chathub::backend::error::BackendError;
    /// use axum::http::StatusCode;
    ///
    /// let err = BackendError::handler(StatusCode::BAD_REQUEST, "Invalid request");
    /// ```
    pub fn handler(status: StatusCode, message: impl Into<String>) -> Self {
        Self::HandlerError {
            status,
            message: message.into(),
        }
    }

    /// Create a new authorization error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    /// Create a new authentication error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    ///
    /// # Status Code Mapping
    ///
    /// - `HandlerError` - Uses the status code from the error
    /// - `Unauthorized` - 401 Unauthorized
    /// - `Forbidden` - 403 Forbidden
    /// - `SharedError` - 400 Bad Request
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::HandlerError { status, .. } => *status,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::SharedError(SharedError::ValidationError { .. }) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error message
    pub fn message(&self) -> String {
        match self {
            Self::HandlerError { message, .. } => message.clone(),
            Self::Unauthorized { message } | Self::Forbidden { message } => message.clone(),
            Self::SharedError(err) => err.to_string(),
        }
    }
}

/// Errors that end a client stream
#[derive(Debug, Error)]
pub enum HubError {
    /// A frame could not be staged
    #[error("write failed after {attempts} attempts: {source}")]
    WriteFailed {
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// Flushing staged frames failed on every attempt
    #[error("flush failed after {attempts} attempts: {source}")]
    FlushFailed {
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

impl HubError {
    pub(crate) fn staging(source: std::io::Error) -> Self {
        Self::WriteFailed {
            attempts: 1,
            source,
        }
    }

    pub(crate) fn flush(err: RetryError<std::io::Error>) -> Self {
        Self::FlushFailed {
            attempts: err.attempts,
            source: err.source,
        }
    }

    /// Attempts made before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::WriteFailed { attempts, .. } | Self::FlushFailed { attempts, .. } => *attempts,
        }
    }
}
