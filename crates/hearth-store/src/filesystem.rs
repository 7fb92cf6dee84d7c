//! Filesystem storage backend.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use hearth_core::Result;

use crate::StorageBackend;

/// Stores photo objects under a base directory, mirroring storage keys as
/// relative paths.
pub struct FilesystemBackend {
    base_path: PathBuf,
}

impl FilesystemBackend {
    /// Create a new filesystem backend with the given base directory.
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    fn full_path(&self, key: &str) -> PathBuf {
        self.base_path.join(key)
    }

    /// Validate that the backend can write, read, and delete files.
    ///
    /// Performs a full round-trip at startup to catch filesystem issues
    /// (permission errors, missing directories) early.
    pub async fn validate(&self) -> std::result::Result<(), String> {
        let test_dir = self.base_path.join("photos/.health-check");
        let test_file = test_dir.join("test.bin");

        fs::create_dir_all(&test_dir)
            .await
            .map_err(|e| format!("create_dir_all({:?}): {}", test_dir, e))?;

        let data = b"storage-health-check";
        fs::write(&test_file, data)
            .await
            .map_err(|e| format!("write({:?}): {}", test_file, e))?;

        let read_data = fs::read(&test_file)
            .await
            .map_err(|e| format!("read({:?}): {}", test_file, e))?;
        if read_data != data {
            return Err("read-back mismatch".to_string());
        }

        fs::remove_file(&test_file)
            .await
            .map_err(|e| format!("remove_file({:?}): {}", test_file, e))?;
        let _ = fs::remove_dir(&test_dir).await;

        Ok(())
    }
}

#[async_trait]
impl StorageBackend for FilesystemBackend {
    async fn write(&self, key: &str, data: &[u8], _content_type: &str) -> Result<()> {
        let full_path = self.full_path(key);
        debug!(
            subsystem = "store",
            component = "filesystem",
            op = "write",
            storage_key = %key,
            byte_size = data.len(),
            "Writing object"
        );

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                warn!(parent = %parent.display(), error = %e, "create_dir_all failed");
                e
            })?;
        }

        // Atomic write: temp file + rename
        let temp_path = full_path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&temp_path, &full_path).await.map_err(|e| {
            warn!(from = %temp_path.display(), to = %full_path.display(), error = %e, "rename failed");
            e
        })?;

        Ok(())
    }

    async fn read(&self, key: &str) -> Result<Vec<u8>> {
        let full_path = self.full_path(key);
        Ok(fs::read(full_path).await?)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.full_path(key);
        if fs::try_exists(&full_path).await? {
            fs::remove_file(full_path).await?;
        }
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_path = self.full_path(key);
        Ok(fs::try_exists(full_path).await?)
    }

    async fn probe(&self) -> bool {
        fs::try_exists(&self.base_path).await.unwrap_or(false)
    }

    fn kind(&self) -> &'static str {
        "filesystem"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_read_delete_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());

        let key = "photos/01/1.bin";
        backend.write(key, b"jpeg bytes", "image/jpeg").await.unwrap();
        assert!(backend.exists(key).await.unwrap());
        assert_eq!(backend.read(key).await.unwrap(), b"jpeg bytes");

        backend.delete(key).await.unwrap();
        assert!(!backend.exists(key).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        backend.delete("photos/00/none.bin").await.unwrap();
    }

    #[tokio::test]
    async fn test_validate_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        backend.validate().await.unwrap();
    }

    #[tokio::test]
    async fn test_probe_reflects_base_path() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FilesystemBackend::new(dir.path());
        assert!(backend.probe().await);

        let gone = FilesystemBackend::new(dir.path().join("missing"));
        assert!(!gone.probe().await);
    }
}
