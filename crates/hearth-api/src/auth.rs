//! Session authentication and role checks.

use axum::http::{header, HeaderMap};

use hearth_core::{Role, SessionRepository, User};

use crate::error::ApiError;
use crate::AppState;

/// Extract the bearer token from an Authorization header, if present.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Resolve the request's session to a user. Fails with 401 if the token is
/// missing, unknown, or expired.
pub async fn require_user(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let token = bearer_token(headers)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    state
        .db
        .sessions
        .get_user(token)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired session".to_string()))
}

/// Like [`require_user`] but additionally requires at least member role.
pub async fn require_member(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let user = require_user(state, headers).await?;
    if user.role < Role::Member {
        return Err(ApiError::Forbidden("Member role required".to_string()));
    }
    Ok(user)
}

/// Like [`require_user`] but requires admin role.
pub async fn require_admin(state: &AppState, headers: &HeaderMap) -> Result<User, ApiError> {
    let user = require_user(state, headers).await?;
    if user.role < Role::Admin {
        return Err(ApiError::Forbidden("Admin role required".to_string()));
    }
    Ok(user)
}

/// Resolve the viewer role for read endpoints. Requests without a valid
/// session browse as guests rather than being rejected.
pub async fn viewer_role(state: &AppState, headers: &HeaderMap) -> Result<Role, ApiError> {
    match bearer_token(headers) {
        Some(token) => Ok(state
            .db
            .sessions
            .get_user(token)
            .await?
            .map(|u| u.role)
            .unwrap_or(Role::Guest)),
        None => Ok(Role::Guest),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_bearer_token_parses_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_missing_header() {
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwYXNz"),
        );
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn test_bearer_token_empty_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer  "));
        assert_eq!(bearer_token(&headers), None);
    }
}
