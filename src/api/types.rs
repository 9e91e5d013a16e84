//! Request and response bodies for the HTTP API.

use crate::question::{DiagramResult, EnginePreference, QuestionRecord, QuestionWithDiagram};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest batch accepted in one request.
pub const MAX_BATCH_QUESTIONS: usize = 200;

/// `POST /v1/diagrams` body.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiagramBatchRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_hint: Option<String>,
    #[serde(default)]
    pub engine_preference: EnginePreference,
    pub questions: Vec<QuestionInput>,
}

/// One question in a batch: the upstream record plus an optional id.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuestionInput {
    /// Defaults to `q{n}` with the 1-based position in the batch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub record: QuestionRecord,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DiagramBatchResponse {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Records with `hasDiagram` and `diagram` merged in, in request order
    pub questions: Vec<QuestionWithDiagram>,
    pub results: Vec<DiagramResult>,
}

/// API error response.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiError {
    pub error: ApiErrorBody,
}

/// Error details.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiErrorBody {
    pub message: String,
    pub r#type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl ApiError {
    /// Create a bad request error (400).
    pub fn bad_request(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "invalid_request_error".to_string(),
                code: Some("invalid_request_error".to_string()),
            },
        }
    }

    /// Create a service unavailable error (503).
    pub fn service_unavailable(message: &str) -> Self {
        Self {
            error: ApiErrorBody {
                message: message.to_string(),
                r#type: "server_error".to_string(),
                code: Some("service_unavailable".to_string()),
            },
        }
    }

    /// Get the HTTP status code for this error.
    fn status_code(&self) -> StatusCode {
        match self.error.code.as_deref() {
            Some("invalid_request_error") => StatusCode::BAD_REQUEST,
            Some("service_unavailable") => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}
