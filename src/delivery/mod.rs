/// Transcript delivery
///
/// Posts a finished execution transcript to an external destination and
/// reports a human-readable status. Delivery runs after a workflow has
/// produced its transcript, never during execution.

// Discord webhook delivery via reqwest
pub mod discord;

// Google Sheets export (integration disabled)
pub mod sheets;

// SMTP email delivery via lettre
pub mod email;

use async_trait::async_trait;

pub use discord::DiscordWebhook;
pub use email::{EmailDelivery, EmailSettings};
pub use sheets::SheetsExport;

/// A channel that accepts a transcript for a destination
///
/// Never fails: problems are reported in the returned status text.
#[async_trait]
pub trait TranscriptDelivery: Send + Sync {
    async fn deliver(&self, transcript: &str, destination: &str) -> String;
}
