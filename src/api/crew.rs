/// Workflow execution endpoints
/// 
/// Accepts a workflow description and streams the live progress transcript
/// back as the engine produces it.

use crate::api::AppState;
use crate::workflow::types::{ExecutionContext, WorkflowRequest};
use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::convert::Infallible;
use tokio_stream::StreamExt;

/// Create workflow execution routes
pub fn create_crew_routes() -> Router<AppState> {
    Router::new()
        .route("/run-crew", post(run_crew))
        .route("/health", get(health_check))
}

/// Execute a workflow and stream its transcript
/// 
/// POST /run-crew
/// Body: { "nodes": [...], "edges": [...], "inputs": { ... } }
/// Returns: text/event-stream of progress lines, ending with a JSON summary
async fn run_crew(State(state): State<AppState>, body: String) -> Result<Response, StatusCode> {
    // Parse JSON body manually to answer malformed payloads with 400
    let workflow = match WorkflowRequest::from_json(&body) {
        Ok(workflow) => workflow,
        Err(e) => {
            tracing::warn!("❌ Rejected workflow execution request: {}", e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    tracing::info!(
        "📥 Received workflow execution request with {} nodes",
        workflow.nodes.len()
    );

    let context = ExecutionContext::for_workflow(&workflow);
    let events = state.engine.stream(workflow, context);
    let chunks = events.map(|event| Ok::<_, Infallible>(event.to_string()));

    Ok((
        [(header::CONTENT_TYPE, "text/event-stream")],
        Body::from_stream(chunks),
    )
        .into_response())
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
