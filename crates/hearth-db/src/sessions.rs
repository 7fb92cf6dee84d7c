//! Session repository implementation.
//!
//! Sessions are opaque bearer tokens: 32 random bytes, hex-encoded. The
//! token itself is the primary key; lookups join straight to the user row.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use hearth_core::{Error, Result, Role, Session, SessionRepository, User};

/// Generate a fresh session token (64 hex chars).
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// PostgreSQL implementation of SessionRepository.
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, user_id: Uuid, ttl_secs: i64) -> Result<Session> {
        let token = generate_token();
        let now = Utc::now();
        let expires_at = now + Duration::seconds(ttl_secs);

        sqlx::query(
            "INSERT INTO session (token, user_id, expires_at_utc, created_at_utc)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(expires_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(Session {
            token,
            user_id,
            expires_at_utc: expires_at,
            created_at_utc: now,
        })
    }

    async fn get_user(&self, token: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            r#"
            SELECT u.id, u.username, u.email, u.password_hash, u.role,
                   u.email_verified, u.failed_logins, u.locked_until, u.created_at_utc
            FROM session s
            JOIN app_user u ON u.id = s.user_id
            WHERE s.token = $1 AND s.expires_at_utc > NOW()
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| User {
            id: r.get("id"),
            username: r.get("username"),
            email: r.get("email"),
            password_hash: r.get("password_hash"),
            role: Role::from_str_lossy(r.get("role")),
            email_verified: r.get("email_verified"),
            failed_logins: r.get("failed_logins"),
            locked_until: r.get("locked_until"),
            created_at_utc: r.get("created_at_utc"),
        }))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM session WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn purge_expired(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at_utc <= NOW()")
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_tokens_are_unique_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
