//! # hearth-db
//!
//! PostgreSQL database layer for hearth.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for photos, albums, tags, users, sessions,
//!   and the background job queue
//!
//! ## Example
//!
//! ```rust,ignore
//! use hearth_db::Database;
//! use hearth_core::{PhotoRepository, Role};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/hearth").await?;
//!     let page = db.photos.list_page(1, 0, 12, Role::Guest).await?;
//!     println!("{} photos visible to guests", page.total_count);
//!     Ok(())
//! }
//! ```

pub mod albums;
pub mod jobs;
pub mod photos;
pub mod pool;
pub mod sessions;
pub mod tags;
pub mod users;

// Re-export core types
pub use hearth_core::*;

// Re-export repository implementations
pub use albums::PgAlbumRepository;
pub use jobs::PgJobRepository;
pub use photos::PgPhotoRepository;
pub use pool::PoolConfig;
pub use sessions::PgSessionRepository;
pub use tags::PgTagRepository;
pub use users::{
    hash_password, validate_password, validate_username, verify_password, PgUserRepository,
};

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Photo repository for CRUD and paginated listings.
    pub photos: PgPhotoRepository,
    /// Album repository with protected-album enforcement.
    pub albums: PgAlbumRepository,
    /// Tag repository.
    pub tags: PgTagRepository,
    /// User account repository.
    pub users: PgUserRepository,
    /// Session token repository.
    pub sessions: PgSessionRepository,
    /// Background job queue.
    pub jobs: PgJobRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            photos: PgPhotoRepository::new(pool.clone()),
            albums: PgAlbumRepository::new(pool.clone()),
            tags: PgTagRepository::new(pool.clone()),
            users: PgUserRepository::new(pool.clone()),
            sessions: PgSessionRepository::new(pool.clone()),
            jobs: PgJobRepository::new(pool.clone()),
            pool,
        }
    }

    /// Connect to the given URL with environment-driven pool settings.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = PoolConfig::from_env().connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with explicit pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = config.connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
