//! # hearth-store
//!
//! Object storage backends for photo bytes.
//!
//! The [`StorageBackend`] trait abstracts over where image objects live;
//! hearth ships a filesystem backend for development and small deployments
//! and an S3 backend for everything else. Backends are probed for
//! availability: a down object store degrades listings (`is_s3_available:
//! false` in gallery responses) instead of failing them.

pub mod filesystem;
pub mod s3;

use async_trait::async_trait;

use hearth_core::Result;

pub use filesystem::FilesystemBackend;
pub use s3::{S3Backend, S3Config};

/// Storage backend trait for different storage implementations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Write data to the specified key.
    async fn write(&self, key: &str, data: &[u8], content_type: &str) -> Result<()>;

    /// Read data from the specified key.
    async fn read(&self, key: &str) -> Result<Vec<u8>>;

    /// Delete data at the specified key.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if data exists at the specified key.
    async fn exists(&self, key: &str) -> Result<bool>;

    /// Cheap availability probe. `false` means the backend is currently
    /// unreachable; callers treat this as a soft condition.
    async fn probe(&self) -> bool;

    /// Backend kind for logging ("filesystem", "s3").
    fn kind(&self) -> &'static str;
}

pub use hearth_core::naming::photo_storage_key;

/// Caches the result of [`StorageBackend::probe`] for a short window.
///
/// Gallery listings report backend availability on every response; probing
/// an S3 endpoint per request would add a network round-trip to each page
/// fetch, so probes are reused within the TTL.
pub struct ProbeCache {
    ttl: std::time::Duration,
    state: tokio::sync::RwLock<Option<(std::time::Instant, bool)>>,
}

impl ProbeCache {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            ttl,
            state: tokio::sync::RwLock::new(None),
        }
    }

    /// Return the cached availability, probing the backend if the cached
    /// value is stale or absent.
    pub async fn check(&self, backend: &dyn StorageBackend) -> bool {
        {
            let state = self.state.read().await;
            if let Some((at, available)) = *state {
                if at.elapsed() < self.ttl {
                    return available;
                }
            }
        }

        let available = backend.probe().await;
        let mut state = self.state.write().await;
        *state = Some((std::time::Instant::now(), available));
        available
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingBackend {
        probes: AtomicUsize,
        available: bool,
    }

    #[async_trait]
    impl StorageBackend for CountingBackend {
        async fn write(&self, _key: &str, _data: &[u8], _content_type: &str) -> Result<()> {
            Ok(())
        }
        async fn read(&self, _key: &str) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        async fn delete(&self, _key: &str) -> Result<()> {
            Ok(())
        }
        async fn exists(&self, _key: &str) -> Result<bool> {
            Ok(false)
        }
        async fn probe(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.available
        }
        fn kind(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_probe_cache_reuses_within_ttl() {
        let backend = CountingBackend {
            probes: AtomicUsize::new(0),
            available: true,
        };
        let cache = ProbeCache::new(Duration::from_secs(60));

        assert!(cache.check(&backend).await);
        assert!(cache.check(&backend).await);
        assert!(cache.check(&backend).await);
        assert_eq!(backend.probes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_probe_cache_zero_ttl_always_probes() {
        let backend = CountingBackend {
            probes: AtomicUsize::new(0),
            available: false,
        };
        let cache = ProbeCache::new(Duration::ZERO);

        assert!(!cache.check(&backend).await);
        assert!(!cache.check(&backend).await);
        assert_eq!(backend.probes.load(Ordering::SeqCst), 2);
    }
}
