pub mod templates;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::auth::pin::RESET_TTL_MINUTES;
use crate::config::SmtpConfig;

/// Out-of-band channel that gets a reset PIN to the account owner.
#[async_trait]
pub trait PinDelivery: Send + Sync {
    async fn deliver(&self, to_email: &str, pin: &str) -> Result<(), String>;
}

pub struct SystemMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl SystemMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, String> {
        let creds = Credentials::new(config.user.clone(), config.pass.clone());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| format!("System SMTP error: {e}"))?
            .port(config.port)
            .credentials(creds)
            .build();

        Ok(Self {
            transport,
            from: config.from.clone(),
        })
    }

    async fn send(&self, to: &str, subject: &str, html_body: &str) -> Result<(), String> {
        let message = Message::builder()
            .from(
                self.from
                    .parse()
                    .map_err(|e| format!("Invalid from address: {e}"))?,
            )
            .to(to.parse().map_err(|e| format!("Invalid to address: {e}"))?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(html_body.to_string())
            .map_err(|e| format!("Failed to build email: {e}"))?;

        self.transport
            .send(message)
            .await
            .map_err(|e| format!("Failed to send email: {e}"))?;

        Ok(())
    }
}

#[async_trait]
impl PinDelivery for SystemMailer {
    async fn deliver(&self, to_email: &str, pin: &str) -> Result<(), String> {
        let html = templates::render_reset_pin(pin, RESET_TTL_MINUTES);
        self.send(to_email, "Your password reset code - Reelgate", &html)
            .await
    }
}

/// Used when SMTP is not configured. The PIN is never written to the log.
pub struct LogOnlyDelivery;

#[async_trait]
impl PinDelivery for LogOnlyDelivery {
    async fn deliver(&self, _to_email: &str, _pin: &str) -> Result<(), String> {
        tracing::warn!("System SMTP not configured. Password reset code was not delivered");
        Ok(())
    }
}
