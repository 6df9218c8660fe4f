/// Transcript delivery endpoints
/// 
/// Forward a finished transcript to Discord, a spreadsheet or an inbox. Each endpoint
/// answers with the delivery channel's status text.

use crate::api::AppState;
use axum::{extract::State, response::Json, routing::post, Router};
use serde::{Deserialize, Serialize};

/// Request body for Discord delivery
#[derive(Debug, Deserialize)]
pub struct DiscordRequest {
    #[serde(default)]
    pub logs: String,
    #[serde(default)]
    pub webhook_url: String,
}

/// Request body for spreadsheet export
#[derive(Debug, Deserialize)]
pub struct SheetsRequest {
    #[serde(default)]
    pub logs: String,
    pub sheet_name: Option<String>,
}

/// Request body for email delivery
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub logs: String,
    pub to: Option<String>,
}

/// Response for every delivery operation
#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub status: String,
}

/// Create transcript delivery routes
pub fn create_delivery_routes() -> Router<AppState> {
    Router::new()
        .route("/post-discord", post(post_discord))
        .route("/export-sheets", post(export_sheets))
        .route("/send-email", post(send_email))
}

/// Post a transcript to a Discord webhook
/// 
/// POST /post-discord
/// Body: { "logs": "...", "webhook_url": "https://discord.com/api/webhooks/..." }
async fn post_discord(
    State(state): State<AppState>,
    Json(payload): Json<DiscordRequest>,
) -> Json<DeliveryResponse> {
    tracing::info!("💬 Posting transcript to Discord");
    let status = state.discord.deliver(&payload.logs, &payload.webhook_url).await;
    Json(DeliveryResponse { status })
}

/// Export a transcript to a spreadsheet
/// 
/// POST /export-sheets
/// Body: { "logs": "...", "sheet_name": "Opsyde Logs" }
async fn export_sheets(
    State(state): State<AppState>,
    Json(payload): Json<SheetsRequest>,
) -> Json<DeliveryResponse> {
    let sheet_name = payload
        .sheet_name
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| state.default_sheet_name.clone());
    tracing::info!("📊 Exporting to sheet: {}", sheet_name);
    let status = state.sheets.deliver(&payload.logs, &sheet_name).await;
    Json(DeliveryResponse { status })
}

/// Mail a transcript
/// 
/// POST /send-email
/// Body: { "logs": "...", "to": "ops@example.com" }
async fn send_email(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> Json<DeliveryResponse> {
    let recipient = payload
        .to
        .filter(|to| !to.is_empty())
        .unwrap_or_else(|| state.default_email_recipient.clone());
    tracing::info!("📧 Sending email to {}", recipient);
    let status = state.email.deliver(&payload.logs, &recipient).await;
    Json(DeliveryResponse { status })
}
