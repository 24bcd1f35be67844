//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Fast hub builders
//! - A frame reader for client byte streams
//! - Custom assertion macros

#![allow(dead_code)]

pub mod assertions;
pub mod streams;

// Re-export commonly used utilities
pub use streams::*;
