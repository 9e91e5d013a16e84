//! Health check endpoint handler.

use crate::api::AppState;
use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: u64,
    pub engines: Vec<&'static str>,
    pub store: String,
    pub max_attempts: u32,
}

/// GET /health - Return service status.
pub async fn handle(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let status = if state.shutdown.is_cancelled() {
        "shutting_down"
    } else {
        "ok"
    };

    Json(HealthResponse {
        status: status.to_string(),
        uptime_seconds: state.metrics_collector.uptime_seconds(),
        engines: state
            .pipeline
            .available_engines()
            .iter()
            .map(|t| t.as_str())
            .collect(),
        store: state.pipeline.store_name().to_string(),
        max_attempts: state.pipeline.max_attempts(),
    })
}
