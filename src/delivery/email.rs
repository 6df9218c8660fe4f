use super::TranscriptDelivery;
use anyhow::Result;
use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};
use std::time::Duration;

const SUBJECT: &str = "Opsyde Crew Output";

/// SMTP account transcripts are sent from
#[derive(Debug, Clone)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub sender: String,
    pub password: String,
    pub timeout: Duration,
}

/// Mails transcripts over SMTP with implicit TLS
#[derive(Debug, Clone)]
pub struct EmailDelivery {
    settings: EmailSettings,
}

impl EmailDelivery {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    fn message(&self, transcript: &str, recipient: &str) -> Result<Message> {
        let message = Message::builder()
            .from(self.settings.sender.parse()?)
            .to(recipient.parse()?)
            .subject(SUBJECT)
            .header(ContentType::TEXT_PLAIN)
            .body(transcript.to_string())?;
        Ok(message)
    }

    async fn send(&self, transcript: &str, recipient: &str) -> Result<()> {
        let message = self.message(transcript, recipient)?;

        // relay() connects with TLS from the first byte (port 465)
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.settings.smtp_host)?
            .credentials(Credentials::new(
                self.settings.sender.clone(),
                self.settings.password.clone(),
            ))
            .timeout(Some(self.settings.timeout))
            .build();

        mailer.send(message).await?;
        Ok(())
    }
}

#[async_trait]
impl TranscriptDelivery for EmailDelivery {
    async fn deliver(&self, transcript: &str, recipient: &str) -> String {
        tracing::info!("📧 Mailing transcript to {} ({} bytes)", recipient, transcript.len());

        match self.send(transcript, recipient).await {
            Ok(()) => "✅ Email sent!".to_string(),
            Err(e) => {
                tracing::error!("❌ Email to {} failed: {}", recipient, e);
                format!("❌ Email failed: {e}")
            }
        }
    }
}
