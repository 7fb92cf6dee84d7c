//! Job handler trait and execution context.

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use hearth_core::{Job, JobType};

/// Context provided to job handlers.
pub struct JobContext {
    /// The job being processed.
    pub job: Job,
}

impl JobContext {
    /// Create a new job context.
    pub fn new(job: Job) -> Self {
        Self { job }
    }

    /// Get the job payload.
    pub fn payload(&self) -> Option<&JsonValue> {
        self.job.payload.as_ref()
    }

    /// Extract a required string field from the payload.
    pub fn payload_str(&self, field: &str) -> Result<&str, String> {
        self.payload()
            .and_then(|p| p.get(field))
            .and_then(|v| v.as_str())
            .ok_or_else(|| format!("payload missing string field '{}'", field))
    }

    /// Extract a required integer field from the payload.
    pub fn payload_i64(&self, field: &str) -> Result<i64, String> {
        self.payload()
            .and_then(|p| p.get(field))
            .and_then(|v| v.as_i64())
            .ok_or_else(|| format!("payload missing integer field '{}'", field))
    }
}

/// Result of job execution.
#[derive(Debug)]
pub enum JobResult {
    /// Job completed successfully.
    Success,
    /// Job failed; it is retried until the attempt limit, then failed
    /// terminally.
    Failed(String),
    /// Job hit a transient condition and should be retried.
    Retry(String),
}

/// Trait for job handlers.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// The job type this handler processes.
    fn job_type(&self) -> JobType;

    /// Execute the job.
    async fn execute(&self, ctx: JobContext) -> JobResult;

    /// Check if this handler can process the given job type.
    fn can_handle(&self, job_type: JobType) -> bool {
        self.job_type() == job_type
    }
}

/// No-op handler for testing.
pub struct NoOpHandler {
    job_type: JobType,
}

impl NoOpHandler {
    /// Create a new no-op handler for the given job type.
    pub fn new(job_type: JobType) -> Self {
        Self { job_type }
    }
}

#[async_trait]
impl JobHandler for NoOpHandler {
    fn job_type(&self) -> JobType {
        self.job_type
    }

    async fn execute(&self, _ctx: JobContext) -> JobResult {
        JobResult::Success
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use uuid::Uuid;

    fn test_job(payload: Option<JsonValue>) -> Job {
        Job {
            id: Uuid::now_v7(),
            job_type: JobType::VerificationEmail,
            status: hearth_core::JobStatus::Pending,
            payload,
            error: None,
            attempts: 1,
            created_at_utc: chrono::Utc::now(),
            started_at_utc: None,
            finished_at_utc: None,
        }
    }

    #[test]
    fn test_payload_str_present() {
        let ctx = JobContext::new(test_job(Some(json!({"email": "a@b.c"}))));
        assert_eq!(ctx.payload_str("email").unwrap(), "a@b.c");
    }

    #[test]
    fn test_payload_str_missing_field() {
        let ctx = JobContext::new(test_job(Some(json!({"email": "a@b.c"}))));
        let err = ctx.payload_str("code").unwrap_err();
        assert!(err.contains("code"));
    }

    #[test]
    fn test_payload_str_no_payload() {
        let ctx = JobContext::new(test_job(None));
        assert!(ctx.payload_str("email").is_err());
    }

    #[test]
    fn test_payload_i64() {
        let ctx = JobContext::new(test_job(Some(json!({"photo_id": 42}))));
        assert_eq!(ctx.payload_i64("photo_id").unwrap(), 42);
        assert!(ctx.payload_i64("missing").is_err());
    }

    #[tokio::test]
    async fn test_noop_handler() {
        let handler = NoOpHandler::new(JobType::VerificationEmail);
        assert_eq!(handler.job_type(), JobType::VerificationEmail);
        assert!(handler.can_handle(JobType::VerificationEmail));
        assert!(!handler.can_handle(JobType::NewPhotoEmail));

        let result = handler.execute(JobContext::new(test_job(None))).await;
        assert!(matches!(result, JobResult::Success));
    }
}
