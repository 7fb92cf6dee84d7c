//! Environment-driven application configuration.

use crate::defaults;
use crate::error::{Error, Result};

/// Storage backend selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// Local directory (development, small deployments).
    Filesystem { base_path: String },
    /// S3-compatible object store.
    S3 {
        endpoint: String,
        region: String,
        bucket: String,
        access_key: String,
        secret_key: String,
    },
}

/// SMTP settings for outbound email.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// From address, e.g. `Hearth <photos@example.com>`.
    pub from: String,
}

/// Top-level configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub storage: StorageConfig,
    /// None disables email jobs (they fail fast with a config error).
    pub smtp: Option<SmtpConfig>,
    /// Public base URL used in email links.
    pub public_url: String,
    pub max_upload_bytes: usize,
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).map_err(|_| Error::Config(format!("{} must be set", name)))
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Load configuration from the environment.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `DATABASE_URL` | required | PostgreSQL connection string |
    /// | `BIND_ADDR` | `0.0.0.0:3000` | HTTP listen address |
    /// | `STORAGE_BACKEND` | `filesystem` | `filesystem` or `s3` |
    /// | `STORAGE_PATH` | `./data/photos` | filesystem base path |
    /// | `S3_ENDPOINT` / `S3_REGION` / `S3_BUCKET` | required for s3 | object store coordinates |
    /// | `S3_ACCESS_KEY` / `S3_SECRET_KEY` | required for s3 | credentials |
    /// | `SMTP_HOST` / `SMTP_PORT` / `SMTP_USER` / `SMTP_PASS` / `SMTP_FROM` | unset | email delivery; unset disables |
    /// | `PUBLIC_URL` | `http://localhost:3000` | base URL in email links |
    /// | `MAX_UPLOAD_BYTES` | 50 MB | multipart upload cap |
    pub fn from_env() -> Result<Self> {
        let database_url = required("DATABASE_URL")?;
        let bind_addr = optional("BIND_ADDR", "0.0.0.0:3000");

        let storage = match optional("STORAGE_BACKEND", "filesystem").as_str() {
            "s3" => StorageConfig::S3 {
                endpoint: required("S3_ENDPOINT")?,
                region: optional("S3_REGION", "us-east-1"),
                bucket: required("S3_BUCKET")?,
                access_key: required("S3_ACCESS_KEY")?,
                secret_key: required("S3_SECRET_KEY")?,
            },
            "filesystem" => StorageConfig::Filesystem {
                base_path: optional("STORAGE_PATH", "./data/photos"),
            },
            other => {
                return Err(Error::Config(format!(
                    "STORAGE_BACKEND must be 'filesystem' or 's3', got '{}'",
                    other
                )))
            }
        };

        let smtp = match std::env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: optional("SMTP_PORT", "465")
                    .parse()
                    .map_err(|_| Error::Config("SMTP_PORT must be a port number".into()))?,
                username: required("SMTP_USER")?,
                password: required("SMTP_PASS")?,
                from: required("SMTP_FROM")?,
            }),
            Err(_) => None,
        };

        let max_upload_bytes = std::env::var("MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::MAX_UPLOAD_BYTES);

        Ok(Self {
            database_url,
            bind_addr,
            storage,
            smtp,
            public_url: optional("PUBLIC_URL", "http://localhost:3000"),
            max_upload_bytes,
        })
    }
}

/// Initial admin account, seeded at startup when the `ADMIN_*` variables
/// are present. Without it a fresh install has no admin and the management
/// endpoints cannot be reached.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl AdminBootstrap {
    /// Read `ADMIN_USERNAME` / `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
    ///
    /// Returns `Ok(None)` when none are set; a partial set is rejected as
    /// a configuration error.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_values(
            std::env::var("ADMIN_USERNAME").ok(),
            std::env::var("ADMIN_EMAIL").ok(),
            std::env::var("ADMIN_PASSWORD").ok(),
        )
    }

    fn from_values(
        username: Option<String>,
        email: Option<String>,
        password: Option<String>,
    ) -> Result<Option<Self>> {
        match (username, email, password) {
            (None, None, None) => Ok(None),
            (Some(username), Some(email), Some(password)) => Ok(Some(Self {
                username,
                email,
                password,
            })),
            _ => Err(Error::Config(
                "ADMIN_USERNAME, ADMIN_EMAIL, and ADMIN_PASSWORD must be set together".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_database_url_is_config_error() {
        // Runs in-process; only assert the error shape for a variable
        // that is certainly unset.
        let err = required("HEARTH_TEST_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("must be set"));
    }

    #[test]
    fn test_optional_falls_back() {
        assert_eq!(optional("HEARTH_TEST_UNSET_VARIABLE", "fallback"), "fallback");
    }

    #[test]
    fn test_admin_bootstrap_absent() {
        assert!(AdminBootstrap::from_values(None, None, None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_admin_bootstrap_complete() {
        let bootstrap = AdminBootstrap::from_values(
            Some("ada".into()),
            Some("ada@example.com".into()),
            Some("hunter2hunter2".into()),
        )
        .unwrap()
        .expect("bootstrap configured");
        assert_eq!(bootstrap.username, "ada");
    }

    #[test]
    fn test_admin_bootstrap_partial_is_config_error() {
        let err =
            AdminBootstrap::from_values(Some("ada".into()), None, None).unwrap_err();
        assert!(err.to_string().contains("together"));
    }
}
