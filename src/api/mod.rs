/// HTTP API Layer
/// 
/// This module provides the REST endpoints around the execution engine.
/// It handles:
/// - Streaming workflow execution
/// - Transcript delivery to external channels
/// - Health checks

// Workflow execution endpoint streaming the progress transcript
pub mod crew;

// Delivery endpoints (Discord, Sheets, email)
pub mod delivery;

use crate::delivery::TranscriptDelivery;
use crate::runtime::engine::ExecutionEngine;
use std::sync::Arc;

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Execution engine shared by all workflow runs
    pub engine: ExecutionEngine,
    /// Discord webhook delivery
    pub discord: Arc<dyn TranscriptDelivery>,
    /// Spreadsheet export
    pub sheets: Arc<dyn TranscriptDelivery>,
    /// SMTP email delivery
    pub email: Arc<dyn TranscriptDelivery>,
    /// Sheet name used when a request names none
    pub default_sheet_name: String,
    /// Recipient used when an email request names none
    pub default_email_recipient: String,
}

// Re-export router builders
pub use crew::create_crew_routes;
pub use delivery::create_delivery_routes;
