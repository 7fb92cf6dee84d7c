//! Structured logging schema and field name constants for hearth.
//!
//! All crates use these constants for consistent structured logging fields
//! so that log aggregation tools can query by standardized field names
//! across every subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → job → sub-calls.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "db", "store", "jobs", "mail"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pool", "worker", "s3", "gallery", "mailer"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "list_page", "upload", "claim_next", "send"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Numeric photo id being operated on.
pub const PHOTO_ID: &str = "photo_id";

/// Numeric album id being operated on.
pub const ALBUM_ID: &str = "album_id";

/// User UUID for the request principal.
pub const USER_ID: &str = "user_id";

/// Job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// Job type enum variant.
pub const JOB_TYPE: &str = "job_type";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of items returned by a listing.
pub const RESULT_COUNT: &str = "result_count";

/// Requested page number (1-based).
pub const PAGE: &str = "page";

/// Requested page size.
pub const PAGE_SIZE: &str = "page_size";

/// Byte length of an uploaded or downloaded object.
pub const BYTE_SIZE: &str = "byte_size";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table or entity affected.
pub const DB_TABLE: &str = "db_table";

// ─── Storage fields ────────────────────────────────────────────────────────

/// Object key within the storage backend.
pub const STORAGE_KEY: &str = "storage_key";

/// Storage backend kind ("filesystem", "s3").
pub const STORAGE_BACKEND: &str = "storage_backend";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
