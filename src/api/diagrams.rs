//! Batch diagram endpoint handler.

use crate::api::{ApiError, AppState, DiagramBatchRequest, DiagramBatchResponse, MAX_BATCH_QUESTIONS};
use crate::pipeline::run_batch;
use crate::question::{DiagramRequest, QuestionWithDiagram};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

/// POST /v1/diagrams - Run a batch of questions through the pipeline.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    body: Result<Json<DiagramBatchRequest>, JsonRejection>,
) -> Result<Json<DiagramBatchResponse>, ApiError> {
    if state.shutdown.is_cancelled() {
        return Err(ApiError::service_unavailable("Server is shutting down"));
    }

    let Json(batch) = body.map_err(|e| {
        warn!(error = %e, "Rejected malformed batch");
        ApiError::bad_request(&e.body_text())
    })?;
    let requests = build_requests(&batch)?;

    info!(
        questions = requests.len(),
        subject = ?batch.subject_hint,
        engine_preference = ?batch.engine_preference,
        "Diagram batch request"
    );

    let report = run_batch(
        state.pipeline.clone(),
        requests,
        state.config.pipeline.concurrency,
        state.shutdown.child_token(),
    )
    .await;

    let questions = batch
        .questions
        .into_iter()
        .zip(&report.results)
        .map(|(input, result)| QuestionWithDiagram::merge(input.record, result))
        .collect();

    Ok(Json(DiagramBatchResponse {
        run_id: report.run_id,
        started_at: report.started_at,
        finished_at: report.finished_at,
        questions,
        results: report.results,
    }))
}

fn build_requests(batch: &DiagramBatchRequest) -> Result<Vec<DiagramRequest>, ApiError> {
    if batch.questions.is_empty() {
        return Err(ApiError::bad_request("questions must not be empty"));
    }
    if batch.questions.len() > MAX_BATCH_QUESTIONS {
        return Err(ApiError::bad_request(&format!(
            "at most {} questions per batch",
            MAX_BATCH_QUESTIONS
        )));
    }

    batch
        .questions
        .iter()
        .enumerate()
        .map(|(index, input)| {
            if input.record.question_text.trim().is_empty() {
                return Err(ApiError::bad_request(&format!(
                    "questions[{}].question_text must not be empty",
                    index
                )));
            }
            let id = input
                .id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("q{}", index + 1));
            Ok(DiagramRequest::from_record(
                id,
                &input.record,
                batch.subject_hint.clone(),
                batch.engine_preference,
            ))
        })
        .collect()
}
