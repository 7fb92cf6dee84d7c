//! Album repository implementation.
//!
//! Enforces the protected-album rules: "All Photos" can be neither renamed
//! nor deleted, and album names are unique case-insensitively.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use hearth_core::{
    is_protected_album, validate_album_name, Album, AlbumRepository, CreateAlbumRequest, Error,
    Result, Role, UpdateAlbumRequest,
};

/// PostgreSQL implementation of AlbumRepository.
pub struct PgAlbumRepository {
    pool: Pool<Postgres>,
}

impl PgAlbumRepository {
    /// Create a new PgAlbumRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn name_taken(&self, name: &str, exclude_id: Option<i64>) -> Result<bool> {
        let row = sqlx::query(
            "SELECT EXISTS(
                 SELECT 1 FROM album
                 WHERE LOWER(name) = LOWER($1) AND ($2::BIGINT IS NULL OR id <> $2)
             ) AS taken",
        )
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.get("taken"))
    }

    async fn get_name(&self, id: i64) -> Result<String> {
        let row = sqlx::query("SELECT name FROM album WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::AlbumNotFound(id))?;
        Ok(row.get("name"))
    }
}

fn map_row_to_album(row: &sqlx::postgres::PgRow) -> Album {
    Album {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        cover_photo_id: row.get("cover_photo_id"),
        photo_count: row.get("photo_count"),
        created_at_utc: row.get("created_at_utc"),
    }
}

/// Shared SELECT with role-filtered photo counts.
const ALBUM_SELECT: &str = r#"
    SELECT
        a.id, a.name, a.description, a.cover_photo_id, a.created_at_utc,
        COUNT(p.id) FILTER (WHERE p.family_only = FALSE OR $1) AS photo_count
    FROM album a
    LEFT JOIN album_photo ap ON ap.album_id = a.id
    LEFT JOIN photo p ON p.id = ap.photo_id
"#;

#[async_trait]
impl AlbumRepository for PgAlbumRepository {
    async fn create(&self, req: &CreateAlbumRequest) -> Result<i64> {
        validate_album_name(&req.name).map_err(Error::InvalidInput)?;
        if self.name_taken(&req.name, None).await? {
            return Err(Error::InvalidInput(format!(
                "An album named '{}' already exists",
                req.name.trim()
            )));
        }

        let row = sqlx::query(
            "INSERT INTO album (name, description, created_at_utc) VALUES ($1, $2, $3)
             RETURNING id",
        )
        .bind(req.name.trim())
        .bind(&req.description)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(row.get("id"))
    }

    async fn update(&self, id: i64, req: &UpdateAlbumRequest) -> Result<()> {
        let current_name = self.get_name(id).await?;

        if let Some(new_name) = &req.name {
            if is_protected_album(&current_name) {
                return Err(Error::Protected(
                    "The 'All Photos' album cannot be renamed".to_string(),
                ));
            }
            if is_protected_album(new_name) {
                return Err(Error::InvalidInput(
                    "'All Photos' is a reserved album name".to_string(),
                ));
            }
            validate_album_name(new_name).map_err(Error::InvalidInput)?;
            if self.name_taken(new_name, Some(id)).await? {
                return Err(Error::InvalidInput(format!(
                    "An album named '{}' already exists",
                    new_name.trim()
                )));
            }
        }

        sqlx::query(
            r#"
            UPDATE album SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                cover_photo_id = COALESCE($4, cover_photo_id)
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.name.as_ref().map(|n| n.trim().to_string()))
        .bind(&req.description)
        .bind(req.cover_photo_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<()> {
        let name = self.get_name(id).await?;
        if is_protected_album(&name) {
            return Err(Error::Protected(
                "The 'All Photos' album cannot be deleted".to_string(),
            ));
        }

        sqlx::query("DELETE FROM album WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, id: i64, viewer: Role) -> Result<Album> {
        let query = format!(
            "{} WHERE a.id = $2 GROUP BY a.id, a.name, a.description, a.cover_photo_id, a.created_at_utc",
            ALBUM_SELECT
        );
        let row = sqlx::query(&query)
            .bind(viewer.can_view_family_only())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::AlbumNotFound(id))?;
        Ok(map_row_to_album(&row))
    }

    async fn list(&self, viewer: Role) -> Result<Vec<Album>> {
        let query = format!(
            "{} GROUP BY a.id, a.name, a.description, a.cover_photo_id, a.created_at_utc
             ORDER BY (LOWER(a.name) = 'all photos') DESC, a.name",
            ALBUM_SELECT
        );
        let rows = sqlx::query(&query)
            .bind(viewer.can_view_family_only())
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(map_row_to_album).collect())
    }

    async fn add_photo(&self, album_id: i64, photo_id: i64) -> Result<()> {
        let result = sqlx::query(
            "INSERT INTO album_photo (album_id, photo_id)
             SELECT $1, $2 WHERE EXISTS(SELECT 1 FROM album WHERE id = $1)
               AND EXISTS(SELECT 1 FROM photo WHERE id = $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(album_id)
        .bind(photo_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        // Distinguish "already a member" (fine) from "no such album/photo".
        if result.rows_affected() == 0 {
            self.get_name(album_id).await?;
            let exists = sqlx::query("SELECT EXISTS(SELECT 1 FROM photo WHERE id = $1) AS e")
                .bind(photo_id)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;
            if !exists.get::<bool, _>("e") {
                return Err(Error::PhotoNotFound(photo_id));
            }
        }
        Ok(())
    }

    async fn remove_photo(&self, album_id: i64, photo_id: i64) -> Result<()> {
        let name = self.get_name(album_id).await?;
        if is_protected_album(&name) {
            return Err(Error::Protected(
                "Photos cannot be removed from 'All Photos'".to_string(),
            ));
        }

        sqlx::query("DELETE FROM album_photo WHERE album_id = $1 AND photo_id = $2")
            .bind(album_id)
            .bind(photo_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}
