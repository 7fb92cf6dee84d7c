//! User repository implementation and password hashing helpers.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sqlx::{Pool, Postgres, Row};
use tracing::warn;
use uuid::Uuid;

use hearth_core::defaults::{LOCKOUT_SECS, MAX_FAILED_LOGINS};
use hearth_core::{Error, Result, Role, User, UserRepository};

/// Hash a password with argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| Error::Internal(format!("password hashing failed: {}", e)))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored PHC hash string.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!(
                subsystem = "db",
                component = "users",
                error = %e,
                "Stored password hash failed to parse"
            );
            false
        }
    }
}

/// Validate a requested password. Length only; complexity rules add little.
pub fn validate_password(password: &str) -> std::result::Result<(), String> {
    let chars = password.chars().count();
    if chars < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if chars > 512 {
        return Err("Password is too long".to_string());
    }
    Ok(())
}

/// Validate a username.
pub fn validate_username(username: &str) -> std::result::Result<(), String> {
    let trimmed = username.trim();
    let chars = trimmed.chars().count();
    if chars < 2 {
        return Err("Username must be at least 2 characters".to_string());
    }
    if chars > 40 {
        return Err("Username must be 40 characters or less".to_string());
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.')
    {
        return Err(
            "Username may only contain alphanumeric characters, hyphens, underscores, and dots"
                .to_string(),
        );
    }
    Ok(())
}

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_row_to_user(row: &sqlx::postgres::PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: Role::from_str_lossy(row.get("role")),
        email_verified: row.get("email_verified"),
        failed_logins: row.get("failed_logins"),
        locked_until: row.get("locked_until"),
        created_at_utc: row.get("created_at_utc"),
    }
}

const USER_COLUMNS: &str = "id, username, email, password_hash, role, email_verified, \
                            failed_logins, locked_until, created_at_utc";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<Uuid> {
        validate_username(username).map_err(Error::InvalidInput)?;
        if !email.contains('@') {
            return Err(Error::InvalidInput("Invalid email address".to_string()));
        }

        let id = Uuid::now_v7();
        sqlx::query(
            r#"
            INSERT INTO app_user (id, username, email, password_hash, role, created_at_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(id)
        .bind(username.trim())
        .bind(email.trim())
        .bind(password_hash)
        .bind(role.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<User> {
        let query = format!("SELECT {} FROM app_user WHERE id = $1", USER_COLUMNS);
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::UserNotFound(id.to_string()))?;
        Ok(map_row_to_user(&row))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!(
            "SELECT {} FROM app_user WHERE LOWER(username) = LOWER($1)",
            USER_COLUMNS
        );
        let row = sqlx::query(&query)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.map(|r| map_row_to_user(&r)))
    }

    async fn list(&self) -> Result<Vec<User>> {
        let query = format!("SELECT {} FROM app_user ORDER BY username", USER_COLUMNS);
        let rows = sqlx::query(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(rows.iter().map(map_row_to_user).collect())
    }

    async fn record_failed_login(&self, id: Uuid) -> Result<()> {
        let lockout_at = Utc::now() + Duration::seconds(LOCKOUT_SECS);
        sqlx::query(
            r#"
            UPDATE app_user SET
                failed_logins = failed_logins + 1,
                locked_until = CASE
                    WHEN failed_logins + 1 >= $2 THEN $3
                    ELSE locked_until
                END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(MAX_FAILED_LOGINS)
        .bind(lockout_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn record_successful_login(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE app_user SET failed_logins = 0, locked_until = NULL WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn mark_email_verified(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE app_user SET email_verified = TRUE WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let result = sqlx::query("UPDATE app_user SET password_hash = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<()> {
        let result = sqlx::query("UPDATE app_user SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::UserNotFound(id.to_string()));
        }
        Ok(())
    }

    async fn set_pending_code(
        &self,
        id: Uuid,
        code: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE app_user SET pending_code = $2, pending_code_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(code)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn consume_pending_code(&self, id: Uuid, code: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE app_user SET pending_code = NULL, pending_code_expires_at = NULL
            WHERE id = $1
              AND pending_code = $2
              AND pending_code_expires_at > NOW()
            "#,
        )
        .bind(id)
        .bind(code)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}
