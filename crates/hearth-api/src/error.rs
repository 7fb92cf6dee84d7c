//! API error type and HTTP status mapping.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

/// Errors returned by API handlers. Every variant maps to a status code
/// and a `{"error": "..."}` JSON body.
#[derive(Debug)]
pub enum ApiError {
    Database(hearth_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
    TooManyRequests(String),
}

impl From<hearth_core::Error> for ApiError {
    fn from(err: hearth_core::Error) -> Self {
        match &err {
            hearth_core::Error::NotFound(msg) => ApiError::NotFound(msg.clone()),
            hearth_core::Error::PhotoNotFound(id) => {
                ApiError::NotFound(format!("Photo not found: {}", id))
            }
            hearth_core::Error::AlbumNotFound(id) => {
                ApiError::NotFound(format!("Album not found: {}", id))
            }
            hearth_core::Error::UserNotFound(who) => {
                ApiError::NotFound(format!("User not found: {}", who))
            }
            hearth_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg.clone()),
            hearth_core::Error::Protected(msg) => ApiError::Conflict(msg.clone()),
            hearth_core::Error::Unauthorized(msg) => ApiError::Unauthorized(msg.clone()),
            hearth_core::Error::Forbidden(msg) => ApiError::Forbidden(msg.clone()),
            hearth_core::Error::Database(sqlx_err) => {
                let msg = sqlx_err.to_string();
                if msg.contains("duplicate key") || msg.contains("unique constraint") {
                    // User-friendly messages for known constraints
                    let friendly_msg = if msg.contains("idx_unique_album_name") {
                        "An album with this name already exists".to_string()
                    } else if msg.contains("idx_unique_tag_name") {
                        "A tag with this name already exists".to_string()
                    } else if msg.contains("idx_unique_username") {
                        "This username is already taken".to_string()
                    } else if msg.contains("idx_unique_email") {
                        "An account with this email already exists".to_string()
                    } else {
                        msg
                    };
                    return ApiError::Conflict(friendly_msg);
                }
                if msg.contains("foreign key") {
                    return ApiError::BadRequest(msg);
                }
                ApiError::Database(err)
            }
            _ => ApiError::Database(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Database(err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::TooManyRequests(msg) => (StatusCode::TOO_MANY_REQUESTS, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: ApiError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_variants_map_to_404() {
        assert_eq!(
            status_of(hearth_core::Error::PhotoNotFound(3).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(hearth_core::Error::AlbumNotFound(7).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(hearth_core::Error::UserNotFound("alice".into()).into()),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_protected_maps_to_conflict() {
        let err: ApiError =
            hearth_core::Error::Protected("Cannot delete the All Photos album".into()).into();
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_invalid_input_maps_to_bad_request() {
        let err: ApiError = hearth_core::Error::InvalidInput("empty name".into()).into();
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_auth_variants_pass_through() {
        assert_eq!(
            status_of(hearth_core::Error::Unauthorized("no session".into()).into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(hearth_core::Error::Forbidden("admin only".into()).into()),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_storage_error_maps_to_internal() {
        let err: ApiError = hearth_core::Error::Storage("bucket gone".into()).into();
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
