//! Domain models and request/response types for hearth.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

// =============================================================================
// ROLES
// =============================================================================

/// Access tier for a user.
///
/// Ordering is meaningful: `Guest < Member < Admin`, so role checks can use
/// comparisons (`role >= Role::Member`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Read-only access to non-family photos.
    Guest,
    /// Full read access, may upload photos.
    Member,
    /// Full access including management screens.
    Admin,
}

impl Role {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Guest => "guest",
            Role::Member => "member",
            Role::Admin => "admin",
        }
    }

    /// Parse a role from its database string. Unknown values map to Guest,
    /// the least privileged tier.
    pub fn from_str_lossy(s: &str) -> Role {
        match s {
            "admin" => Role::Admin,
            "member" => Role::Member,
            _ => Role::Guest,
        }
    }

    /// Whether this role may see photos flagged family-only.
    pub fn can_view_family_only(&self) -> bool {
        *self >= Role::Member
    }
}

// =============================================================================
// PHOTOS
// =============================================================================

/// Full photo record with associations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Photo {
    /// Global numeric id (BIGSERIAL; not per-album sequential).
    pub id: i64,
    /// Key of the image object within the storage backend.
    pub storage_key: String,
    /// Original upload filename.
    pub filename: String,
    /// MIME type of the image.
    pub content_type: String,
    pub title: Option<String>,
    /// Date the photo was taken, if known.
    pub taken_at: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Hidden from guest-role users when true.
    pub family_only: bool,
    /// Uploading user, if the account still exists.
    pub uploaded_by: Option<Uuid>,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    /// Tag names, sorted.
    pub tags: Vec<String>,
    /// Names of albums this photo belongs to.
    pub albums: Vec<String>,
}

/// Compact photo representation used in gallery pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoSummary {
    pub id: i64,
    pub title: Option<String>,
    pub taken_at: Option<NaiveDate>,
    pub family_only: bool,
    pub created_at_utc: DateTime<Utc>,
}

/// Metadata for a newly uploaded photo. Image bytes travel separately
/// (multipart part handled by the API layer).
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePhotoRequest {
    pub filename: String,
    pub content_type: String,
    pub title: Option<String>,
    pub taken_at: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(default)]
    pub family_only: bool,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Albums to add the photo to, in addition to "All Photos".
    #[serde(default)]
    pub album_ids: Vec<i64>,
}

/// Partial update of photo metadata. `None` fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePhotoRequest {
    pub title: Option<String>,
    pub taken_at: Option<NaiveDate>,
    pub notes: Option<String>,
    pub family_only: Option<bool>,
}

// =============================================================================
// ALBUMS AND TAGS
// =============================================================================

/// Album with its photo count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub cover_photo_id: Option<i64>,
    /// Photos visible to the requesting role.
    pub photo_count: i64,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateAlbumRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAlbumRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub cover_photo_id: Option<i64>,
}

/// Tag with usage count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub photo_count: i64,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// USERS AND SESSIONS
// =============================================================================

/// User account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2id PHC string. Never serialized in responses.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub failed_logins: i32,
    /// Set when the account is locked out after repeated failures.
    pub locked_until: Option<DateTime<Utc>>,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Opaque bearer session.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at_utc: DateTime<Utc>,
    pub created_at_utc: DateTime<Utc>,
}

// =============================================================================
// BACKGROUND JOBS
// =============================================================================

/// Kind of background job. All current job types are email deliveries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    VerificationEmail,
    PasswordResetEmail,
    NewPhotoEmail,
}

impl JobType {
    /// Database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::VerificationEmail => "verification_email",
            JobType::PasswordResetEmail => "password_reset_email",
            JobType::NewPhotoEmail => "new_photo_email",
        }
    }

    /// Parse from the database string.
    pub fn parse(s: &str) -> Option<JobType> {
        match s {
            "verification_email" => Some(JobType::VerificationEmail),
            "password_reset_email" => Some(JobType::PasswordResetEmail),
            "new_photo_email" => Some(JobType::NewPhotoEmail),
            _ => None,
        }
    }
}

/// Lifecycle state of a queued job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }
}

/// Queued background job.
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: Uuid,
    pub job_type: JobType,
    pub status: JobStatus,
    /// Handler-specific payload (recipient, codes, photo ids).
    pub payload: Option<JsonValue>,
    pub error: Option<String>,
    pub attempts: i32,
    pub created_at_utc: DateTime<Utc>,
    pub started_at_utc: Option<DateTime<Utc>>,
    pub finished_at_utc: Option<DateTime<Utc>>,
}

// =============================================================================
// API RESPONSE ENVELOPES
// =============================================================================

/// Response contract for `GET /api/albums/:id/photos`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumPhotosResponse {
    pub photos: Vec<PhotoSummary>,
    /// True when a further page would return at least one photo.
    pub has_more: bool,
    /// False when the storage backend failed its last availability probe.
    /// Listings still succeed; clients render fallback icons.
    pub is_s3_available: bool,
    pub total_count: i64,
    pub album: Album,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(Role::Guest < Role::Member);
        assert!(Role::Member < Role::Admin);
    }

    #[test]
    fn test_role_family_only_visibility() {
        assert!(!Role::Guest.can_view_family_only());
        assert!(Role::Member.can_view_family_only());
        assert!(Role::Admin.can_view_family_only());
    }

    #[test]
    fn test_role_round_trip() {
        for role in [Role::Guest, Role::Member, Role::Admin] {
            assert_eq!(Role::from_str_lossy(role.as_str()), role);
        }
    }

    #[test]
    fn test_role_unknown_string_is_guest() {
        assert_eq!(Role::from_str_lossy("superuser"), Role::Guest);
    }

    #[test]
    fn test_job_type_round_trip() {
        for jt in [
            JobType::VerificationEmail,
            JobType::PasswordResetEmail,
            JobType::NewPhotoEmail,
        ] {
            assert_eq!(JobType::parse(jt.as_str()), Some(jt));
        }
        assert_eq!(JobType::parse("unknown"), None);
    }

    #[test]
    fn test_user_password_hash_not_serialized() {
        let user = User {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Member,
            email_verified: true,
            failed_logins: 0,
            locked_until: None,
            created_at_utc: Utc::now(),
        };
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("argon2id"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_role_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"member\"").unwrap();
        assert_eq!(role, Role::Member);
    }
}
