//! Default values and tunable constants shared across hearth crates.

/// Default gallery page size (photos per fetched page).
pub const DEFAULT_PAGE_SIZE: u32 = 12;

/// Maximum page size a client may request.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Name of the protected default album. Cannot be renamed or deleted.
pub const ALL_PHOTOS_ALBUM: &str = "All Photos";

/// Number of album position records kept in the client-side cache.
pub const POSITION_CACHE_CAPACITY: usize = 32;

/// Failed login attempts before the account is locked out.
pub const MAX_FAILED_LOGINS: i32 = 5;

/// Lockout duration after too many failed logins, in seconds.
pub const LOCKOUT_SECS: i64 = 15 * 60;

/// Session token lifetime in seconds (30 days).
pub const SESSION_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Password reset / verification code validity in seconds (1 hour).
pub const RESET_CODE_TTL_SECS: i64 = 60 * 60;

/// Interval between expired-session sweeps, in seconds.
pub const SESSION_PURGE_INTERVAL_SECS: u64 = 60 * 60;

/// Maximum upload size accepted by the API, in bytes (50 MB).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Maximum delivery attempts for a queued email job.
pub const JOB_MAX_ATTEMPTS: i32 = 3;

/// Maximum concurrent background jobs.
pub const JOB_MAX_CONCURRENT: usize = 2;

/// Worker polling interval when the queue is empty, in milliseconds.
pub const JOB_POLL_INTERVAL_MS: u64 = 1000;

/// Hard cap on a single job execution, in seconds.
pub const JOB_TIMEOUT_SECS: u64 = 60;

/// Capacity of the worker event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_bounds() {
        assert!(DEFAULT_PAGE_SIZE <= MAX_PAGE_SIZE);
        assert!(DEFAULT_PAGE_SIZE > 0);
    }

    #[test]
    fn test_protected_album_name() {
        assert_eq!(ALL_PHOTOS_ALBUM, "All Photos");
    }
}
