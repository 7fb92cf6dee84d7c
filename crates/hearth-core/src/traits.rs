//! Repository trait definitions.
//!
//! Each storage concern gets a trait here; `hearth-db` provides the
//! PostgreSQL implementations. Handlers and the job worker depend on these
//! seams, which keeps them mockable in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    Album, CreateAlbumRequest, CreatePhotoRequest, Job, JobType, Photo, PhotoSummary, Role,
    Session, Tag, UpdateAlbumRequest, UpdatePhotoRequest, User,
};

/// One page of an album listing, with the album-wide total for the
/// requesting role.
#[derive(Debug, Clone)]
pub struct PhotoPageResult {
    pub photos: Vec<PhotoSummary>,
    pub total_count: i64,
}

/// Photo CRUD and paginated listing.
#[async_trait]
pub trait PhotoRepository: Send + Sync {
    /// Insert a photo record and its album memberships. Returns the new id
    /// and the storage key assigned to the image object.
    async fn insert(&self, req: &CreatePhotoRequest, uploaded_by: Option<Uuid>)
        -> Result<(i64, String)>;

    /// Fetch a photo with tags and album names. Guests never receive
    /// family-only photos.
    async fn get(&self, id: i64, viewer: Role) -> Result<Photo>;

    /// Partial metadata update.
    async fn update(&self, id: i64, req: &UpdatePhotoRequest) -> Result<()>;

    /// Delete the photo row. Returns the storage key so the caller can
    /// remove the underlying object.
    async fn delete(&self, id: i64) -> Result<String>;

    /// List one page of an album, newest first, filtered by viewer role.
    async fn list_page(
        &self,
        album_id: i64,
        offset: u64,
        limit: u32,
        viewer: Role,
    ) -> Result<PhotoPageResult>;
}

/// Album management with protected-album enforcement.
#[async_trait]
pub trait AlbumRepository: Send + Sync {
    async fn create(&self, req: &CreateAlbumRequest) -> Result<i64>;

    /// Rejects renames of "All Photos" and case-insensitive duplicates.
    async fn update(&self, id: i64, req: &UpdateAlbumRequest) -> Result<()>;

    /// Rejects deleting "All Photos". Memberships cascade.
    async fn delete(&self, id: i64) -> Result<()>;

    async fn get(&self, id: i64, viewer: Role) -> Result<Album>;

    /// All albums with photo counts visible to the viewer.
    async fn list(&self, viewer: Role) -> Result<Vec<Album>>;

    async fn add_photo(&self, album_id: i64, photo_id: i64) -> Result<()>;

    async fn remove_photo(&self, album_id: i64, photo_id: i64) -> Result<()>;
}

/// Tag management.
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Tag>>;

    /// Replace a photo's tag set transactionally.
    async fn set_for_photo(&self, photo_id: i64, tags: &[String]) -> Result<()>;

    async fn get_for_photo(&self, photo_id: i64) -> Result<Vec<String>>;

    /// Remove tags no longer referenced by any photo.
    async fn prune_unused(&self) -> Result<u64>;
}

/// User accounts and login bookkeeping.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, username: &str, email: &str, password_hash: &str, role: Role)
        -> Result<Uuid>;

    async fn get(&self, id: Uuid) -> Result<User>;

    /// Case-insensitive username lookup.
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn list(&self) -> Result<Vec<User>>;

    /// Bump the failed-login counter; applies the lockout once the
    /// threshold is crossed.
    async fn record_failed_login(&self, id: Uuid) -> Result<()>;

    /// Reset the counter and lockout after a successful login.
    async fn record_successful_login(&self, id: Uuid) -> Result<()>;

    async fn mark_email_verified(&self, id: Uuid) -> Result<()>;

    /// Replace the stored password hash (used by password reset).
    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    async fn set_role(&self, id: Uuid, role: Role) -> Result<()>;

    /// Store a short-lived verification / reset code.
    async fn set_pending_code(&self, id: Uuid, code: &str, expires_at: DateTime<Utc>)
        -> Result<()>;

    /// Consume a pending code if it matches and has not expired.
    async fn consume_pending_code(&self, id: Uuid, code: &str) -> Result<bool>;
}

/// Opaque bearer sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn create(&self, user_id: Uuid, ttl_secs: i64) -> Result<Session>;

    /// Resolve a token to its user, if the session exists and is current.
    async fn get_user(&self, token: &str) -> Result<Option<User>>;

    async fn delete(&self, token: &str) -> Result<()>;

    /// Remove expired sessions. Returns the number purged.
    async fn purge_expired(&self) -> Result<u64>;
}

/// Background job queue.
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn queue(&self, job_type: JobType, payload: Option<JsonValue>) -> Result<Uuid>;

    /// Claim the oldest pending job, marking it running. Safe under
    /// concurrent workers (FOR UPDATE SKIP LOCKED).
    async fn claim_next(&self) -> Result<Option<Job>>;

    async fn complete(&self, job_id: Uuid) -> Result<()>;

    /// Record a failure. Jobs under the attempt limit return to pending.
    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()>;
}
