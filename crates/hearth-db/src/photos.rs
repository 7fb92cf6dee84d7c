//! Photo repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use hearth_core::{
    photo_storage_key, validate_tag_name, CreatePhotoRequest, Error, Photo, PhotoPageResult,
    PhotoRepository, PhotoSummary, Result, Role, UpdatePhotoRequest,
};

/// PostgreSQL implementation of PhotoRepository.
pub struct PgPhotoRepository {
    pool: Pool<Postgres>,
}

impl PgPhotoRepository {
    /// Create a new PgPhotoRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_summary(row: &sqlx::postgres::PgRow) -> PhotoSummary {
    PhotoSummary {
        id: row.get("id"),
        title: row.get("title"),
        taken_at: row.get("taken_at"),
        family_only: row.get("family_only"),
        created_at_utc: row.get("created_at_utc"),
    }
}

#[async_trait]
impl PhotoRepository for PgPhotoRepository {
    async fn insert(
        &self,
        req: &CreatePhotoRequest,
        uploaded_by: Option<Uuid>,
    ) -> Result<(i64, String)> {
        for tag in &req.tags {
            validate_tag_name(tag).map_err(Error::InvalidInput)?;
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // The storage key embeds the photo id, so the row is inserted with a
        // placeholder and keyed in the same transaction.
        let row = sqlx::query(
            r#"
            INSERT INTO photo
                (storage_key, filename, content_type, title, taken_at, notes,
                 family_only, uploaded_by, created_at_utc, updated_at_utc)
            VALUES ('', $1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING id
            "#,
        )
        .bind(&req.filename)
        .bind(&req.content_type)
        .bind(&req.title)
        .bind(req.taken_at)
        .bind(&req.notes)
        .bind(req.family_only)
        .bind(uploaded_by)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let photo_id: i64 = row.get("id");

        let storage_key = photo_storage_key(photo_id);
        sqlx::query("UPDATE photo SET storage_key = $2 WHERE id = $1")
            .bind(photo_id)
            .bind(&storage_key)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        // Every photo is a member of the protected default album.
        sqlx::query(
            r#"
            INSERT INTO album_photo (album_id, photo_id)
            SELECT id, $1 FROM album WHERE LOWER(name) = 'all photos'
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(photo_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        for album_id in &req.album_ids {
            sqlx::query(
                "INSERT INTO album_photo (album_id, photo_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(album_id)
            .bind(photo_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        for tag in &req.tags {
            sqlx::query("INSERT INTO tag (name, created_at_utc) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(tag.trim())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;

            let tag_row = sqlx::query("SELECT id FROM tag WHERE LOWER(name) = LOWER($1)")
                .bind(tag.trim())
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;
            let tag_id: i64 = tag_row.get("id");

            sqlx::query(
                "INSERT INTO photo_tag (photo_id, tag_id) VALUES ($1, $2)
                 ON CONFLICT DO NOTHING",
            )
            .bind(photo_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "db",
            component = "photos",
            op = "insert",
            photo_id,
            storage_key = %storage_key,
            "Photo inserted"
        );
        Ok((photo_id, storage_key))
    }

    async fn get(&self, id: i64, viewer: Role) -> Result<Photo> {
        let row = sqlx::query(
            r#"
            SELECT id, storage_key, filename, content_type, title, taken_at,
                   notes, family_only, uploaded_by, created_at_utc, updated_at_utc
            FROM photo
            WHERE id = $1 AND (family_only = FALSE OR $2)
            "#,
        )
        .bind(id)
        .bind(viewer.can_view_family_only())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::PhotoNotFound(id))?;

        let tags: Vec<String> = sqlx::query(
            r#"
            SELECT t.name FROM tag t
            JOIN photo_tag pt ON pt.tag_id = t.id
            WHERE pt.photo_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?
        .into_iter()
        .map(|r| r.get("name"))
        .collect();

        let albums: Vec<String> = sqlx::query(
            r#"
            SELECT a.name FROM album a
            JOIN album_photo ap ON ap.album_id = a.id
            WHERE ap.photo_id = $1
            ORDER BY a.name
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?
        .into_iter()
        .map(|r| r.get("name"))
        .collect();

        Ok(Photo {
            id: row.get("id"),
            storage_key: row.get("storage_key"),
            filename: row.get("filename"),
            content_type: row.get("content_type"),
            title: row.get("title"),
            taken_at: row.get("taken_at"),
            notes: row.get("notes"),
            family_only: row.get("family_only"),
            uploaded_by: row.get("uploaded_by"),
            created_at_utc: row.get("created_at_utc"),
            updated_at_utc: row.get("updated_at_utc"),
            tags,
            albums,
        })
    }

    async fn update(&self, id: i64, req: &UpdatePhotoRequest) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE photo SET
                title = COALESCE($2, title),
                taken_at = COALESCE($3, taken_at),
                notes = COALESCE($4, notes),
                family_only = COALESCE($5, family_only),
                updated_at_utc = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&req.title)
        .bind(req.taken_at)
        .bind(&req.notes)
        .bind(req.family_only)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::PhotoNotFound(id));
        }
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<String> {
        let row = sqlx::query("DELETE FROM photo WHERE id = $1 RETURNING storage_key")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::PhotoNotFound(id))?;
        Ok(row.get("storage_key"))
    }

    async fn list_page(
        &self,
        album_id: i64,
        offset: u64,
        limit: u32,
        viewer: Role,
    ) -> Result<PhotoPageResult> {
        let can_view_family = viewer.can_view_family_only();

        let total_row = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM photo p
            JOIN album_photo ap ON ap.photo_id = p.id
            WHERE ap.album_id = $1 AND (p.family_only = FALSE OR $2)
            "#,
        )
        .bind(album_id)
        .bind(can_view_family)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        let total_count: i64 = total_row.get("total");

        let rows = sqlx::query(
            r#"
            SELECT p.id, p.title, p.taken_at, p.family_only, p.created_at_utc
            FROM photo p
            JOIN album_photo ap ON ap.photo_id = p.id
            WHERE ap.album_id = $1 AND (p.family_only = FALSE OR $2)
            ORDER BY p.created_at_utc DESC, p.id DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(album_id)
        .bind(can_view_family)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let photos = rows.iter().map(map_row_to_summary).collect();
        Ok(PhotoPageResult {
            photos,
            total_count,
        })
    }
}
