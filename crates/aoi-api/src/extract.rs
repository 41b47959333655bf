//! Handler-side access to the authenticated caller.

use crate::error::ApiError;
use aoi_kernel::PeerIdentity;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// The [`PeerIdentity`] attached by [`crate::authenticate`].
///
/// Rejects with 401 when the request carries no identity.
#[derive(Debug, Clone)]
pub struct Caller(pub PeerIdentity);

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<PeerIdentity>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| ApiError::Unauthenticated("authentication required".to_string()))
    }
}
