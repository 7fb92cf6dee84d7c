//! Error types for hearth.

use thiserror::Error;

/// Result type alias using hearth's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for hearth operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Photo not found
    #[error("Photo not found: {0}")]
    PhotoNotFound(i64),

    /// Album not found
    #[error("Album not found: {0}")]
    AlbumNotFound(i64),

    /// User not found
    #[error("User not found: {0}")]
    UserNotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Attempted mutation of a protected resource ("All Photos")
    #[error("Protected: {0}")]
    Protected(String),

    /// Authentication failed or session missing/expired
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (role too low)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Object storage operation failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Email delivery failed
    #[error("Mail error: {0}")]
    Mail(String),

    /// Background job error
    #[error("Job error: {0}")]
    Job(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("test resource".to_string());
        assert_eq!(err.to_string(), "Not found: test resource");
    }

    #[test]
    fn test_error_display_photo_not_found() {
        let err = Error::PhotoNotFound(42);
        assert_eq!(err.to_string(), "Photo not found: 42");
    }

    #[test]
    fn test_error_display_album_not_found() {
        let err = Error::AlbumNotFound(7);
        assert_eq!(err.to_string(), "Album not found: 7");
    }

    #[test]
    fn test_error_display_protected() {
        let err = Error::Protected("All Photos cannot be deleted".to_string());
        assert_eq!(err.to_string(), "Protected: All Photos cannot be deleted");
    }

    #[test]
    fn test_error_display_unauthorized() {
        let err = Error::Unauthorized("invalid session".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid session");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("admin role required".to_string());
        assert_eq!(err.to_string(), "Forbidden: admin role required");
    }

    #[test]
    fn test_error_display_storage() {
        let err = Error::Storage("bucket unreachable".to_string());
        assert_eq!(err.to_string(), "Storage error: bucket unreachable");
    }

    #[test]
    fn test_error_display_mail() {
        let err = Error::Mail("smtp relay refused".to_string());
        assert_eq!(err.to_string(), "Mail error: smtp relay refused");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number");
        assert!(json_err.is_err());

        let err: Error = json_err.unwrap_err().into();
        match err {
            Error::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err: Error = io_err.into();
        match err {
            Error::Io(_) => {}
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
