//! Job queue repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use hearth_core::defaults::JOB_MAX_ATTEMPTS;
use hearth_core::{Error, Job, JobRepository, JobStatus, JobType, Result};

/// PostgreSQL implementation of JobRepository.
pub struct PgJobRepository {
    pool: Pool<Postgres>,
}

impl PgJobRepository {
    /// Create a new PgJobRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn str_to_status(s: &str) -> JobStatus {
        match s {
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Pending,
        }
    }

    fn map_row(row: &sqlx::postgres::PgRow) -> Result<Job> {
        let type_str: String = row.get("job_type");
        let job_type = JobType::parse(&type_str)
            .ok_or_else(|| Error::Job(format!("unknown job type '{}'", type_str)))?;
        let status_str: String = row.get("status");

        Ok(Job {
            id: row.get("id"),
            job_type,
            status: Self::str_to_status(&status_str),
            payload: row.get("payload"),
            error: row.get("error"),
            attempts: row.get("attempts"),
            created_at_utc: row.get("created_at_utc"),
            started_at_utc: row.get("started_at_utc"),
            finished_at_utc: row.get("finished_at_utc"),
        })
    }
}

#[async_trait]
impl JobRepository for PgJobRepository {
    async fn queue(&self, job_type: JobType, payload: Option<JsonValue>) -> Result<Uuid> {
        let id = Uuid::now_v7();
        sqlx::query(
            "INSERT INTO job (id, job_type, status, payload, created_at_utc)
             VALUES ($1, $2, 'pending', $3, $4)",
        )
        .bind(id)
        .bind(job_type.as_str())
        .bind(payload)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    async fn claim_next(&self) -> Result<Option<Job>> {
        let row = sqlx::query(
            r#"
            UPDATE job SET status = 'running', started_at_utc = NOW(),
                           attempts = attempts + 1
            WHERE id = (
                SELECT id FROM job
                WHERE status = 'pending'
                ORDER BY created_at_utc
                LIMIT 1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING id, job_type, status, payload, error, attempts,
                      created_at_utc, started_at_utc, finished_at_utc
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(|r| Self::map_row(&r)).transpose()
    }

    async fn complete(&self, job_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE job SET status = 'completed', error = NULL, finished_at_utc = NOW()
             WHERE id = $1",
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn fail(&self, job_id: Uuid, error: &str) -> Result<()> {
        // Under the attempt limit the job returns to pending for a retry;
        // at the limit it is failed terminally.
        sqlx::query(
            r#"
            UPDATE job SET
                status = CASE WHEN attempts >= $3 THEN 'failed' ELSE 'pending' END,
                error = $2,
                finished_at_utc = CASE WHEN attempts >= $3 THEN NOW() ELSE NULL END
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(error)
        .bind(JOB_MAX_ATTEMPTS)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}
