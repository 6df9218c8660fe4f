use super::TranscriptDelivery;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Posts transcripts to a Discord channel webhook
#[derive(Debug, Clone)]
pub struct DiscordWebhook {
    client: reqwest::Client,
}

impl DiscordWebhook {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build Discord HTTP client: {}", e))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl TranscriptDelivery for DiscordWebhook {
    async fn deliver(&self, transcript: &str, webhook_url: &str) -> String {
        tracing::info!("💬 Posting transcript to Discord ({} bytes)", transcript.len());

        let response = match self
            .client
            .post(webhook_url)
            .json(&json!({ "content": transcript }))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::error!("❌ Discord request failed: {}", e);
                return format!("❌ Discord failed: {e}");
            }
        };

        // Discord answers a successful webhook post with 204 No Content
        if response.status() == reqwest::StatusCode::NO_CONTENT {
            return "✅ Sent to Discord".to_string();
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("⚠️ Discord returned {}: {}", status, body);
        format!("❌ Discord error: {body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invalid_webhook_url_is_reported() {
        let discord = DiscordWebhook::new(Duration::from_secs(1)).unwrap();
        let status = discord.deliver("logs", "not a url").await;
        assert!(status.starts_with("❌ Discord failed:"), "{status}");
    }
}
