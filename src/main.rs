/// Opsyde: streaming workflow execution server
/// 
/// Main entry point. Loads configuration from the environment and starts
/// the HTTP server with workflow execution and delivery endpoints.

use opsyde::{config::Config, server::start_server};

/// Application entry point
/// 
/// The server provides:
/// - Streaming workflow execution at /run-crew
/// - Transcript delivery at /post-discord and /export-sheets
/// - Health check at /health
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration (defaults to 0.0.0.0:8000)
    let config = Config::default();

    // Start the server
    start_server(config).await?;

    Ok(())
}
