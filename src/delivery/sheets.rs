use super::TranscriptDelivery;
use async_trait::async_trait;

/// Spreadsheet export; the Sheets integration is disabled, so the export is
/// only acknowledged
#[derive(Debug, Clone, Default)]
pub struct SheetsExport;

#[async_trait]
impl TranscriptDelivery for SheetsExport {
    async fn deliver(&self, transcript: &str, destination: &str) -> String {
        tracing::info!("📊 Sheet export requested for '{}' ({} bytes)", destination, transcript.len());
        format!("✅ Would export to sheet '{destination}' (Google Sheets integration disabled)")
    }
}
