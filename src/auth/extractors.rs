use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use super::{
    claims::Claims,
    jwt::{JwtKeys, TokenError},
};
use crate::error::AppError;

/// Header carrying the session token.
pub const AUTH_HEADER: &str = "x-auth-token";

/// Extracts and validates the token, yielding its claims.
/// A missing header is `Unauthorized`; anything unverifiable is `BadToken`.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let header = parts
            .headers
            .get(AUTH_HEADER)
            .filter(|v| !v.is_empty())
            .ok_or(AppError::Unauthorized)?;

        let token = header.to_str().map_err(|_| {
            warn!("non-ascii auth token");
            AppError::BadToken(TokenError::Invalid)
        })?;

        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "rejected auth token");
            AppError::BadToken(e)
        })?;

        parts.extensions.insert(claims.clone());
        Ok(AuthUser(claims))
    }
}
