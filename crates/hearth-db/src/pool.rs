//! PostgreSQL connection pool setup.
//!
//! Pool sizing comes from the environment so deployments can tune it
//! without a rebuild. The defaults suit a single small server.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use hearth_core::{Error, Result};

/// Connection pool sizing and timeouts.
///
/// Environment overrides, all optional:
///
/// | Variable | Default |
/// |----------|---------|
/// | `DB_MAX_CONNECTIONS` | 8 |
/// | `DB_MIN_CONNECTIONS` | 1 |
/// | `DB_ACQUIRE_TIMEOUT_SECS` | 30 |
/// | `DB_IDLE_TIMEOUT_SECS` | 600 |
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 8,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
        }
    }
}

fn env_u64(name: &str) -> Option<u64> {
    std::env::var(name).ok()?.parse().ok()
}

impl PoolConfig {
    /// Read pool settings from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            max_connections: env_u64("DB_MAX_CONNECTIONS")
                .map(|v| (v as u32).max(1))
                .unwrap_or(base.max_connections),
            min_connections: env_u64("DB_MIN_CONNECTIONS")
                .map(|v| v as u32)
                .unwrap_or(base.min_connections),
            acquire_timeout: env_u64("DB_ACQUIRE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(base.acquire_timeout),
            idle_timeout: env_u64("DB_IDLE_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(base.idle_timeout),
        }
    }

    /// Open a pool against `database_url` with these settings.
    pub async fn connect(&self, database_url: &str) -> Result<PgPool> {
        let pool = PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .acquire_timeout(self.acquire_timeout)
            .idle_timeout(self.idle_timeout)
            .connect(database_url)
            .await
            .map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "pool",
            max_connections = self.max_connections,
            min_connections = self.min_connections,
            pool_size = pool.size(),
            "Connection pool ready"
        );
        Ok(pool)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::default();
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_from_env_without_overrides_matches_defaults() {
        // None of the DB_* variables are set in the test environment.
        let config = PoolConfig::from_env();
        assert_eq!(config.max_connections, PoolConfig::default().max_connections);
        assert_eq!(config.acquire_timeout, PoolConfig::default().acquire_timeout);
    }

    #[test]
    fn test_env_u64_rejects_garbage() {
        assert_eq!(env_u64("HEARTH_TEST_UNSET_VARIABLE"), None);
    }
}
