//! Sends the account verification email after signup.

use async_trait::async_trait;

use hearth_core::JobType;

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::mailer::Mailer;

/// Handler for [`JobType::VerificationEmail`].
///
/// Payload: `{"email": "...", "username": "...", "code": "..."}`.
pub struct VerificationEmailHandler {
    mailer: Mailer,
    public_url: String,
}

impl VerificationEmailHandler {
    pub fn new(mailer: Mailer, public_url: String) -> Self {
        Self { mailer, public_url }
    }
}

#[async_trait]
impl JobHandler for VerificationEmailHandler {
    fn job_type(&self) -> JobType {
        JobType::VerificationEmail
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
             Welcome to the family photo library. Your verification code is:\n\n\
             \t{}\n\n\
             Enter it at {}/verify to activate your account. The code expires\n\
             in one hour.\n",
            username, code, self.public_url
        );

        match self
            .mailer
            .send(&email, "Verify your account", body)
            .await
        {
            Ok(()) => JobResult::Success,
            Err(e) => JobResult::Retry(e.to_string()),
        }
    }
}
