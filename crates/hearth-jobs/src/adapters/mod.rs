//! Email job handlers, one per job type.

pub mod new_photo_email;
pub mod password_reset_email;
pub mod verification_email;

pub use new_photo_email::NewPhotoEmailHandler;
pub use password_reset_email::PasswordResetEmailHandler;
pub use verification_email::VerificationEmailHandler;
