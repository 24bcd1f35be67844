/**
 * Client Identity Resolution
 *
 * Every stream and producer request is attributed to an identity key. The
 * key selects the session, so all tabs of one client share one inbound
 * queue. How the key is read from a request is pluggable through
 * `IdentityResolver`:
 *
 * - `CookieIdentity` - the `userId` cookie, taken verbatim
 * - `JwtIdentity` - the `sub` claim of a token sent as `Authorization: Bearer`
 *   or in the `token` cookie
 */

use axum::http::{header, HeaderMap};
use std::sync::Arc;
use thiserror::Error;

use crate::backend::auth::sessions::TokenKeys;

/// Why no identity could be read from a request
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("invalid token: {0}")]
    InvalidToken(String),
}

/// Reads the identity key from request headers
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Result<String, IdentityError>;
}

/// Shared resolver handle kept in application state
pub type SharedResolver = Arc<dyn IdentityResolver>;

/// Value of cookie `name`, if present and non-empty
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim_matches('"').to_string())
        .filter(|value| !value.is_empty())
}

/// Identity taken from a cookie
#[derive(Debug, Clone)]
pub struct CookieIdentity {
    cookie: String,
}

impl CookieIdentity {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self {
            cookie: cookie.into(),
        }
    }
}

impl Default for CookieIdentity {
    fn default() -> Self {
        Self::new("userId")
    }
}

impl IdentityResolver for CookieIdentity {
    fn resolve(&self, headers: &HeaderMap) -> Result<String, IdentityError> {
        cookie_value(headers, &self.cookie).ok_or(IdentityError::Missing("userId cookie"))
    }
}

/// Identity taken from a verified JWT
#[derive(Debug, Clone)]
pub struct JwtIdentity {
    keys: TokenKeys,
}

impl JwtIdentity {
    pub fn new(keys: TokenKeys) -> Self {
        Self { keys }
    }

    fn token(headers: &HeaderMap) -> Option<String> {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .or_else(|| cookie_value(headers, "token"))
    }
}

impl IdentityResolver for JwtIdentity {
    fn resolve(&self, headers: &HeaderMap) -> Result<String, IdentityError> {
        let token = Self::token(headers).ok_or(IdentityError::Missing("bearer token"))?;
        let claims = self
            .keys
            .verify_token(&token)
            .map_err(|e| IdentityError::InvalidToken(e.to_string()))?;
        if claims.sub.is_empty() {
            return Err(IdentityError::Missing("subject claim"));
        }
        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use std::time::Duration;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_identity() {
        let map = headers(&[(header::COOKIE, "theme=dark; userId=alice; lang=en")]);
        assert_eq!(CookieIdentity::default().resolve(&map).unwrap(), "alice");
    }

    #[test]
    fn test_cookie_identity_across_headers() {
        let map = headers(&[(header::COOKIE, "theme=dark"), (header::COOKIE, "userId=bob")]);
        assert_eq!(CookieIdentity::default().resolve(&map).unwrap(), "bob");
    }

    #[test]
    fn test_cookie_identity_missing() {
        let map = headers(&[(header::COOKIE, "userIdx=alice; userId=")]);
        assert_eq!(
            CookieIdentity::default().resolve(&map),
            Err(IdentityError::Missing("userId cookie"))
        );
        assert!(CookieIdentity::default().resolve(&HeaderMap::new()).is_err());
    }

    #[test]
    fn test_jwt_identity_from_bearer_and_cookie() {
        let keys = TokenKeys::from_secret("secret");
        let token = keys.create_token("carol", Duration::from_secs(60)).unwrap();
        let resolver = JwtIdentity::new(keys);

        let bearer = headers(&[(header::AUTHORIZATION, &format!("Bearer {}", token))]);
        assert_eq!(resolver.resolve(&bearer).unwrap(), "carol");

        let cookie = headers(&[(header::COOKIE, &format!("token={}", token))]);
        assert_eq!(resolver.resolve(&cookie).unwrap(), "carol");
    }

    #[test]
    fn test_jwt_identity_rejects_bad_token() {
        let resolver = JwtIdentity::new(TokenKeys::from_secret("secret"));
        let map = headers(&[(header::AUTHORIZATION, "Bearer nope")]);
        assert!(matches!(resolver.resolve(&map), Err(IdentityError::InvalidToken(_))));
        assert_eq!(
            resolver.resolve(&HeaderMap::new()),
            Err(IdentityError::Missing("bearer token"))
        );
    }
}
