/**
 * Server Configuration
 *
 * This module turns a loaded `HubConfig` into the collaborators the server
 * needs at startup, currently the identity resolver.
 *
 * # Configuration Sources
 *
 * `HubConfig::load` reads defaults, the optional TOML file named by
 * `CHATHUB_CONFIG` and `CHATHUB_*` environment variables. The binary
 * loads `.env` first, so variables may also come from there.
 */

use std::sync::Arc;

use crate::backend::auth::identity::{CookieIdentity, JwtIdentity, SharedResolver};
use crate::backend::auth::sessions::TokenKeys;
use crate::shared::{AuthMode, ConfigError, HubConfig};

/// Build the identity resolver selected by `config.auth_mode`
///
/// # Errors
///
/// * `ConfigError::MissingValue` - JWT mode without a secret
pub fn build_resolver(config: &HubConfig) -> Result<SharedResolver, ConfigError> {
    match config.auth_mode {
        AuthMode::Cookie => {
            tracing::info!("[Server] Identities resolved from the userId cookie");
            Ok(Arc::new(CookieIdentity::default()))
        }
        AuthMode::Jwt => {
            let secret = config
                .jwt_secret
                .as_deref()
                .filter(|secret| !secret.is_empty())
                .ok_or(ConfigError::MissingValue("jwt_secret"))?;
            tracing::info!("[Server] Identities resolved from JWT subject claims");
            Ok(Arc::new(JwtIdentity::new(TokenKeys::from_secret(secret))))
        }
    }
}
