//! Bearer-token authentication for HTTP and WebSocket entry points.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

use crate::api::error::ApiError;
use crate::directory::ports::SessionDirectory;
use crate::messaging::domain::UserId;

/// Pulls the bearer token out of the `Authorization` header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves the request headers to an authenticated identity.
///
/// # Errors
///
/// Returns 401 when the header is missing, malformed, or names a token
/// the session directory does not recognize.
pub async fn authenticate<S>(sessions: &S, headers: &HeaderMap) -> Result<UserId, ApiError>
where
    S: SessionDirectory + ?Sized,
{
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::unauthorized("missing bearer token"))?;
    resolve(sessions, token).await
}

/// Resolves a raw token string to an authenticated identity.
///
/// # Errors
///
/// Returns 401 for unknown or expired tokens.
pub async fn resolve<S>(sessions: &S, token: &str) -> Result<UserId, ApiError>
where
    S: SessionDirectory + ?Sized,
{
    sessions
        .resolve_token(token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("invalid or expired token"))
}
