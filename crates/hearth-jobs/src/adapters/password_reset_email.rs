//! Sends the password reset code email.

use async_trait::async_trait;

use hearth_core::JobType;

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::mailer::Mailer;

/// Handler for [`JobType::PasswordResetEmail`].
///
/// Payload: `{"email": "...", "username": "...", "code": "..."}`.
pub struct PasswordResetEmailHandler {
    mailer: Mailer,
    public_url: String,
}

impl PasswordResetEmailHandler {
    pub fn new(mailer: Mailer, public_url: String) -> Self {
        Self { mailer, public_url }
    }
}

#[async_trait]
impl JobHandler for PasswordResetEmailHandler {
    fn job_type(&self) -> JobType {
        JobType::PasswordResetEmail
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        let email = match ctx.payload_str("email") {
            Ok(v) => v.to_string(),
            Err(e) => return JobResult::Failed(e),
        };
        let username = match ctx.payload_str("username") {
            Ok(v) => v.to_string(),
            Err(e) => return JobResult::Failed(e),
        };
        let code = match ctx.payload_str("code") {
            Ok(v) => v.to_string(),
            Err(e) => return JobResult::Failed(e),
        };

        let body = format!(
            "Hi {},\n\n\
             A password reset was requested for your account. Your reset code is:\n\n\
             \t{}\n\n\
             Enter it at {}/reset within one hour. If you did not request this,\n\
             you can ignore this email.\n",
            username, code, self.public_url
        );

        match self.mailer.send(&email, "Password reset code", body).await {
            Ok(()) => JobResult::Success,
            Err(e) => JobResult::Retry(e.to_string()),
        }
    }
}
