//! SMTP email delivery.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{Message, SmtpTransport, Transport};
use rand::Rng;
use tracing::{debug, info};

use hearth_core::{Error, Result, SmtpConfig};

/// Alphabet for verification / reset codes. Uppercase and digits only, so
/// codes survive being read aloud or retyped.
const CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const CODE_LEN: usize = 8;

/// Generate a random one-time code.
pub fn generate_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// SMTP mailer wrapping a pooled transport.
///
/// `SmtpTransport::send` blocks, so delivery runs on the blocking thread
/// pool to keep the job worker responsive.
#[derive(Clone)]
pub struct Mailer {
    transport: SmtpTransport,
    from: String,
}

impl Mailer {
    /// Build a mailer from SMTP configuration. Uses implicit TLS
    /// (TLS-wrapped connection, typically port 465).
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let tls = TlsParameters::new(config.host.clone())
            .map_err(|e| Error::Mail(format!("TLS setup failed: {}", e)))?;

        let transport = SmtpTransport::relay(&config.host)
            .map_err(|e| Error::Mail(format!("SMTP relay setup failed: {}", e)))?
            .port(config.port)
            .tls(Tls::Wrapper(tls))
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    /// Send a plain-text email.
    pub async fn send(&self, to: &str, subject: &str, body: String) -> Result<()> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| Error::Mail(format!("invalid from address: {}", e)))?,
            )
            .to(to
                .parse()
                .map_err(|e| Error::Mail(format!("invalid recipient '{}': {}", to, e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)
            .map_err(|e| Error::Mail(format!("message build failed: {}", e)))?;

        debug!(
            subsystem = "jobs",
            component = "mailer",
            op = "send",
            recipient = %to,
            "Sending email"
        );

        let transport = self.transport.clone();
        let result = tokio::task::spawn_blocking(move || transport.send(&message))
            .await
            .map_err(|e| Error::Mail(format!("send task panicked: {}", e)))?;

        result.map_err(|e| Error::Mail(format!("SMTP send failed: {}", e)))?;
        info!(
            subsystem = "jobs",
            component = "mailer",
            recipient = %to,
            "Email sent"
        );
        Ok(())
    }
}
