//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};

use hearth_core::{validate_tag_name, Error, Result, Tag, TagRepository};

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT
                t.id,
                t.name,
                t.created_at_utc,
                COUNT(pt.photo_id) AS photo_count
            FROM tag t
            LEFT JOIN photo_tag pt ON pt.tag_id = t.id
            GROUP BY t.id, t.name, t.created_at_utc
            ORDER BY t.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let tags = rows
            .into_iter()
            .map(|row| Tag {
                id: row.get("id"),
                name: row.get("name"),
                photo_count: row.get("photo_count"),
                created_at_utc: row.get("created_at_utc"),
            })
            .collect();

        Ok(tags)
    }

    async fn set_for_photo(&self, photo_id: i64, tags: &[String]) -> Result<()> {
        // Validate all tag names first
        for tag_name in tags {
            validate_tag_name(tag_name).map_err(Error::InvalidInput)?;
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        // Remove existing tags
        sqlx::query("DELETE FROM photo_tag WHERE photo_id = $1")
            .bind(photo_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for tag_name in tags {
            // Ensure tag exists
            sqlx::query(
                "INSERT INTO tag (name, created_at_utc) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(tag_name.trim())
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            // Link tag to photo
            sqlx::query(
                r#"
                INSERT INTO photo_tag (photo_id, tag_id)
                SELECT $1, id FROM tag WHERE LOWER(name) = LOWER($2)
                ON CONFLICT DO NOTHING
                "#,
            )
            .bind(photo_id)
            .bind(tag_name.trim())
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn get_for_photo(&self, photo_id: i64) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT t.name FROM tag t
            JOIN photo_tag pt ON pt.tag_id = t.id
            WHERE pt.photo_id = $1
            ORDER BY t.name
            "#,
        )
        .bind(photo_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|row| row.get("name")).collect())
    }

    async fn prune_unused(&self) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM tag WHERE NOT EXISTS (
                 SELECT 1 FROM photo_tag pt WHERE pt.tag_id = tag.id
             )",
        )
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}
