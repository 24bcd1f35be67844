/**
 * Identity Extraction
 *
 * Handlers that act on behalf of a client take an `Identity` argument.
 * The extractor runs the configured `IdentityResolver` against the request
 * headers and rejects the request with 401 when no identity can be read.
 *
 * Administrative handlers take an `Admin` argument instead, which also
 * requires the identity to be listed in `HubConfig::admins` and rejects
 * everyone else with 403.
 */

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use std::sync::Arc;

use crate::backend::auth::identity::SharedResolver;
use crate::backend::error::BackendError;
use crate::shared::HubConfig;

/// Identity key of the calling client
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity(pub String);

impl<S> FromRequestParts<S> for Identity
where
    SharedResolver: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let resolver = SharedResolver::from_ref(state);
        let identity = resolver.resolve(&parts.headers).map_err(|e| {
            tracing::warn!("[Auth] Rejecting {} {}: {}", parts.method, parts.uri.path(), e);
            e
        })?;
        Ok(Identity(identity))
    }
}

/// Identity allowed to use the administrative endpoints
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Admin(pub String);

impl<S> FromRequestParts<S> for Admin
where
    SharedResolver: FromRef<S>,
    Arc<HubConfig>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = BackendError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Identity(identity) = Identity::from_request_parts(parts, state).await?;
        if !Arc::<HubConfig>::from_ref(state).is_admin(&identity) {
            tracing::warn!(
                "[Auth] {} may not use {} {}",
                identity,
                parts.method,
                parts.uri.path()
            );
            return Err(BackendError::forbidden(format!(
                "{} is not allowed to use {}",
                identity,
                parts.uri.path()
            )));
        }
        Ok(Admin(identity))
    }
}
