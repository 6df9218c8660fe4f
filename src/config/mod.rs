/// Configuration management for the Opsyde engine
///
/// Handles server configuration, logging defaults, delivery settings and
/// execution engine parameters.

use crate::runtime::engine::DEFAULT_STREAM_BUFFER;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Transcript delivery configuration
    pub delivery: DeliveryConfig,
    /// Execution engine configuration
    pub engine: EngineConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Server port number
    pub port: u16,
    /// Default log filter when RUST_LOG is unset (e.g., "info", "opsyde=debug")
    pub log_filter: String,
}

/// Settings for posting transcripts to external channels
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Sheet name used when an export request names none
    pub default_sheet_name: String,
    /// Timeout for Discord webhook calls, in seconds
    pub discord_timeout_secs: u64,
    /// SMTP relay for email delivery (implicit TLS)
    pub smtp_host: String,
    /// Sending account, also used as the SMTP login
    pub email_sender: String,
    pub email_password: String,
    /// Recipient used when an email request names none
    pub default_email_recipient: String,
    /// Timeout for SMTP sessions, in seconds
    pub email_timeout_secs: u64,
}

/// Execution engine parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Progress events that may wait for a slow consumer before the loop blocks
    pub stream_buffer: usize,
}

impl Default for Config {
    /// Default configuration with ENV_VAR support for container deployment
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: std::env::var("OPSYDE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: std::env::var("OPSYDE_PORT")
                    .unwrap_or_else(|_| "8000".to_string())
                    .parse()
                    .unwrap_or(8000),
                log_filter: std::env::var("OPSYDE_LOG").unwrap_or_else(|_| "info".to_string()),
            },
            delivery: DeliveryConfig {
                default_sheet_name: std::env::var("OPSYDE_SHEET_NAME")
                    .unwrap_or_else(|_| "Opsyde Logs".to_string()),
                discord_timeout_secs: std::env::var("OPSYDE_DISCORD_TIMEOUT_SECS")
                    .ok()
                    .and_then(|secs| secs.parse().ok())
                    .unwrap_or(30),
                smtp_host: std::env::var("OPSYDE_SMTP_HOST")
                    .unwrap_or_else(|_| "smtp.gmail.com".to_string()),
                email_sender: std::env::var("EMAIL_SENDER").unwrap_or_default(),
                email_password: std::env::var("EMAIL_PASSWORD").unwrap_or_default(),
                default_email_recipient: std::env::var("OPSYDE_EMAIL_TO")
                    .unwrap_or_else(|_| "default@example.com".to_string()),
                email_timeout_secs: std::env::var("OPSYDE_EMAIL_TIMEOUT_SECS")
                    .ok()
                    .and_then(|secs| secs.parse().ok())
                    .unwrap_or(30),
            },
            engine: EngineConfig {
                stream_buffer: std::env::var("OPSYDE_STREAM_BUFFER")
                    .ok()
                    .and_then(|size| size.parse().ok())
                    .filter(|size: &usize| *size > 0)
                    .unwrap_or(DEFAULT_STREAM_BUFFER),
            },
        }
    }
}
