//! Startup provisioning of the initial admin account.
//!
//! Registration always produces guest accounts and only an admin can
//! promote them, so a fresh install needs one admin seeded from the
//! environment before the management endpoints are usable.

use tracing::info;

use hearth_core::{AdminBootstrap, Result, Role, UserRepository};
use hearth_db::hash_password;

/// Ensure the bootstrap admin exists and holds the admin role.
///
/// Creates the account (email pre-verified) when the username is unknown,
/// promotes it when it exists at a lower tier, and leaves an existing
/// admin untouched. The stored password of an existing account is never
/// overwritten.
pub async fn ensure_admin(
    users: &dyn UserRepository,
    bootstrap: &AdminBootstrap,
) -> Result<()> {
    if let Some(existing) = users.get_by_username(&bootstrap.username).await? {
        if existing.role < Role::Admin {
            users.set_role(existing.id, Role::Admin).await?;
            info!(
                subsystem = "api",
                op = "bootstrap_admin",
                user_id = %existing.id,
                "Existing account promoted to admin"
            );
        }
        return Ok(());
    }

    let password_hash = hash_password(&bootstrap.password)?;
    let id = users
        .create(
            &bootstrap.username,
            &bootstrap.email,
            &password_hash,
            Role::Admin,
        )
        .await?;
    users.mark_email_verified(id).await?;
    info!(
        subsystem = "api",
        op = "bootstrap_admin",
        user_id = %id,
        "Admin account created"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use hearth_core::{Error, User};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct MemoryUsers {
        users: Mutex<Vec<User>>,
        role_changes: AtomicUsize,
    }

    #[async_trait]
    impl UserRepository for MemoryUsers {
        async fn create(
            &self,
            username: &str,
            email: &str,
            password_hash: &str,
            role: Role,
        ) -> hearth_core::Result<Uuid> {
            let id = Uuid::now_v7();
            self.users.lock().unwrap().push(User {
                id,
                username: username.to_string(),
                email: email.to_string(),
                password_hash: password_hash.to_string(),
                role,
                email_verified: false,
                failed_logins: 0,
                locked_until: None,
                created_at_utc: Utc::now(),
            });
            Ok(id)
        }

        async fn get(&self, id: Uuid) -> hearth_core::Result<User> {
            self.users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == id)
                .cloned()
                .ok_or_else(|| Error::UserNotFound(id.to_string()))
        }

        async fn get_by_username(&self, username: &str) -> hearth_core::Result<Option<User>> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username.eq_ignore_ascii_case(username))
                .cloned())
        }

        async fn list(&self) -> hearth_core::Result<Vec<User>> {
            Ok(self.users.lock().unwrap().clone())
        }

        async fn record_failed_login(&self, _id: Uuid) -> hearth_core::Result<()> {
            unreachable!("not exercised by bootstrap")
        }

        async fn record_successful_login(&self, _id: Uuid) -> hearth_core::Result<()> {
            unreachable!("not exercised by bootstrap")
        }

        async fn mark_email_verified(&self, id: Uuid) -> hearth_core::Result<()> {
            for user in self.users.lock().unwrap().iter_mut() {
                if user.id == id {
                    user.email_verified = true;
                }
            }
            Ok(())
        }

        async fn set_password(&self, _id: Uuid, _hash: &str) -> hearth_core::Result<()> {
            unreachable!("not exercised by bootstrap")
        }

        async fn set_role(&self, id: Uuid, role: Role) -> hearth_core::Result<()> {
            self.role_changes.fetch_add(1, Ordering::SeqCst);
            for user in self.users.lock().unwrap().iter_mut() {
                if user.id == id {
                    user.role = role;
                }
            }
            Ok(())
        }

        async fn set_pending_code(
            &self,
            _id: Uuid,
            _code: &str,
            _expires_at: DateTime<Utc>,
        ) -> hearth_core::Result<()> {
            unreachable!("not exercised by bootstrap")
        }

        async fn consume_pending_code(&self, _id: Uuid, _code: &str) -> hearth_core::Result<bool> {
            unreachable!("not exercised by bootstrap")
        }
    }

    fn bootstrap() -> AdminBootstrap {
        AdminBootstrap {
            username: "ada".to_string(),
            email: "ada@example.com".to_string(),
            password: "correct horse battery staple".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fresh_install_gets_a_verified_admin() {
        let users = MemoryUsers::default();
        ensure_admin(&users, &bootstrap()).await.unwrap();

        let admin = users.get_by_username("ada").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(admin.email_verified);
        assert!(admin.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_existing_account_is_promoted_not_recreated() {
        let users = MemoryUsers::default();
        users
            .create("ada", "ada@example.com", "$argon2id$existing", Role::Guest)
            .await
            .unwrap();

        ensure_admin(&users, &bootstrap()).await.unwrap();

        let all = users.list().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].role, Role::Admin);
        // The account keeps its password; bootstrap never resets one.
        assert_eq!(all[0].password_hash, "$argon2id$existing");
    }

    #[tokio::test]
    async fn test_existing_admin_is_left_alone() {
        let users = MemoryUsers::default();
        users
            .create("ada", "ada@example.com", "$argon2id$existing", Role::Admin)
            .await
            .unwrap();

        ensure_admin(&users, &bootstrap()).await.unwrap();
        assert_eq!(users.role_changes.load(Ordering::SeqCst), 0);
    }
}
