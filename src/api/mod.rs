//! # HTTP API
//!
//! Batch diagram generation over HTTP.
//!
//! ## Endpoints
//!
//! - `POST /v1/diagrams` - Run a batch of questions through the pipeline
//! - `GET /health` - Service status, uptime and configured engines
//! - `GET /metrics` - Prometheus text exposition
//!
//! ## Example
//!
//! ```no_run
//! use plotwise::api::{create_router, AppState};
//! use plotwise::config::PlotwiseConfig;
//! use plotwise::pipeline::DiagramPipeline;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(PlotwiseConfig::default());
//! let client = Arc::new(reqwest::Client::new());
//! let pipeline = Arc::new(DiagramPipeline::from_config(&config, client)?);
//!
//! let state = Arc::new(AppState::new(config, pipeline));
//! let app = create_router(state);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8700").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Errors use one JSON envelope:
//! ```json
//! {
//!   "error": {
//!     "message": "questions must not be empty",
//!     "type": "invalid_request_error",
//!     "code": "invalid_request_error"
//!   }
//! }
//! ```

mod diagrams;
mod health;
pub mod types;

pub use types::*;

use crate::config::PlotwiseConfig;
use crate::metrics::MetricsCollector;
use crate::pipeline::DiagramPipeline;
use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// Maximum request body size (10 MB).
const MAX_BODY_SIZE: usize = 10 * 1024 * 1024;

/// Shared application state accessible to all handlers.
pub struct AppState {
    pub config: Arc<PlotwiseConfig>,
    pub pipeline: Arc<DiagramPipeline>,
    /// Server startup time for uptime tracking
    pub start_time: Instant,
    /// Metrics collector for observability
    pub metrics_collector: Arc<MetricsCollector>,
    /// Cancelled on shutdown; every batch runs under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Arc<PlotwiseConfig>, pipeline: Arc<DiagramPipeline>) -> Self {
        let start_time = Instant::now();

        // Initialize metrics (safe to call multiple times - will reuse existing if already set)
        let prometheus_handle = crate::metrics::setup_metrics().unwrap_or_else(|e| {
            // Already installed (e.g., in tests): build a detached handle instead
            tracing::debug!("Metrics already initialized, creating new handle: {}", e);
            metrics_exporter_prometheus::PrometheusBuilder::new()
                .build_recorder()
                .handle()
        });

        Self {
            config,
            pipeline,
            start_time,
            metrics_collector: Arc::new(MetricsCollector::new(start_time, prometheus_handle)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Use an externally owned shutdown token.
    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}

/// Create the main API router with all endpoints configured.
pub fn create_router(state: Arc<AppState>) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_seconds);

    Router::new()
        .route("/v1/diagrams", post(diagrams::handle))
        .route("/health", get(health::handle))
        .route("/metrics", get(crate::metrics::metrics_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_SIZE))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
