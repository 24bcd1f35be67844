//! Middleware Module
//!
//! Request processing that runs before handlers.
//!
//! # Architecture
//!
//! - **`auth`** - `Identity` and `Admin` extractors backed by the configured resolver
//! - **`json`** - `ApiJson` body extractor with JSON error responses
//!
//! Request tracing is applied as a `tower-http` layer in `routes::router`.

pub mod auth;
pub mod json;

pub use auth::{Admin, Identity};
pub use json::ApiJson;
