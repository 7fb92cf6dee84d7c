//! Notifies family members when a new photo is uploaded.

use async_trait::async_trait;
use tracing::warn;

use hearth_core::{JobType, Role, UserRepository};
use hearth_db::Database;

use crate::handler::{JobContext, JobHandler, JobResult};
use crate::mailer::Mailer;

/// Handler for [`JobType::NewPhotoEmail`].
///
/// Payload: `{"photo_id": 1, "title": "...", "uploader": "..."}`. Sends to
/// every verified member- or admin-role account. Partial delivery failures
/// are logged but do not fail the job; a retry would re-send to everyone
/// who already got the email.
pub struct NewPhotoEmailHandler {
    db: Database,
    mailer: Mailer,
    public_url: String,
}

impl NewPhotoEmailHandler {
    pub fn new(db: Database, mailer: Mailer, public_url: String) -> Self {
        Self {
            db,
            mailer,
            public_url,
        }
    }
}

#[async_trait]
impl JobHandler for NewPhotoEmailHandler {
    fn job_type(&self) -> JobType {
        JobType::NewPhotoEmail
    }

    async fn execute(&self, ctx: JobContext) -> JobResult {
        let photo_id = match ctx.payload_i64("photo_id") {
            Ok(v) => v,
            Err(e) => return JobResult::Failed(e),
        };
        let title = ctx.payload_str("title").unwrap_or("a new photo").to_string();
        let uploader = ctx.payload_str("uploader").unwrap_or("someone").to_string();

        let users = match self.db.users.list().await {
            Ok(users) => users,
            Err(e) => return JobResult::Retry(format!("listing recipients failed: {}", e)),
        };

        let body = format!(
            "{} added \"{}\" to the family photo library.\n\n\
             See it at {}/photos/{}\n",
            uploader, title, self.public_url, photo_id
        );

        let mut sent = 0usize;
        for user in users
            .iter()
            .filter(|u| u.email_verified && u.role >= Role::Member)
        {
            match self
                .mailer
                .send(&user.email, "New photo in the family library", body.clone())
                .await
            {
                Ok(()) => sent += 1,
                Err(e) => {
                    warn!(
                        subsystem = "jobs",
                        component = "new_photo_email",
                        recipient = %user.email,
                        error_msg = %e,
                        "Notification delivery failed"
                    );
                }
            }
        }

        tracing::debug!(
            subsystem = "jobs",
            component = "new_photo_email",
            photo_id,
            result_count = sent,
            "Notifications sent"
        );
        JobResult::Success
    }
}
