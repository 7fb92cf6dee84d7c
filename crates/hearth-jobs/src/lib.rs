//! # hearth-jobs
//!
//! Background job queue for hearth. All current job types are email
//! deliveries (verification, password reset, new-photo notifications);
//! queueing them keeps SMTP latency and outages out of request handlers.
//!
//! This crate provides:
//! - Async job processing with concurrent workers
//! - Worker lifecycle events via broadcast channels
//! - Retry logic with a configurable attempt limit
//!
//! ## Example
//!
//! ```ignore
//! use hearth_jobs::{Mailer, VerificationEmailHandler, WorkerBuilder, WorkerConfig};
//! use hearth_db::Database;
//!
//! let db = Database::connect("postgres://...").await?;
//! let mailer = Mailer::new(&smtp_config)?;
//!
//! let worker = WorkerBuilder::new(db)
//!     .with_config(WorkerConfig::from_env())
//!     .with_handler(VerificationEmailHandler::new(mailer, public_url))
//!     .build();
//!
//! let handle = worker.start();
//! // ...
//! handle.shutdown();
//! ```

pub mod adapters;
pub mod handler;
pub mod mailer;
pub mod worker;

// Re-export core types
pub use hearth_core::*;

pub use adapters::{NewPhotoEmailHandler, PasswordResetEmailHandler, VerificationEmailHandler};
pub use handler::{JobContext, JobHandler, JobResult, NoOpHandler};
pub use mailer::{generate_code, Mailer};
pub use worker::{JobWorker, WorkerBuilder, WorkerConfig, WorkerEvent, WorkerHandle};
