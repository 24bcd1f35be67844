//! Authentication Module
//!
//! This module decides which client a request belongs to.
//!
//! # Architecture
//!
//! - **`identity`** - Pluggable identity resolution (cookie or JWT)
//! - **`sessions`** - JWT token generation and validation
//!
//! # Module Structure
//!
//! ```text
//! auth/
//! ├── mod.rs          - Module exports and documentation
//! ├── identity.rs     - IdentityResolver and its implementations
//! └── sessions.rs     - JWT token management
//! ```

pub mod identity;
pub mod sessions;

pub use identity::{
    CookieIdentity, IdentityError, IdentityResolver, JwtIdentity, SharedResolver,
};
pub use sessions::{Claims, TokenKeys};
