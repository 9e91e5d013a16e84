//! # Metrics Collection Module
//!
//! Prometheus export for the diagram pipeline, served at `GET /metrics`.
//!
//! ## Metrics Tracked
//!
//! **Counters:**
//! - `plotwise_diagrams_total{status}` - Questions finished, by terminal status
//! - `plotwise_attempts_total{tool, outcome}` - Render attempts by engine and outcome
//! - `plotwise_classifier_fallbacks_total` - Classifications replaced by the generic default
//! - `plotwise_model_tokens_total{stage, kind}` - Prompt and completion tokens reported by model endpoints
//!
//! **Histograms:**
//! - `plotwise_stage_duration_seconds{stage}` - Duration of classify, select, render and review

pub mod handler;

pub use handler::metrics_handler;

use crate::agent::ChatCompletionResponse;
use crate::logging::extract_tokens;
use std::time::Instant;

pub const DIAGRAMS_TOTAL: &str = "plotwise_diagrams_total";
pub const ATTEMPTS_TOTAL: &str = "plotwise_attempts_total";
pub const CLASSIFIER_FALLBACKS_TOTAL: &str = "plotwise_classifier_fallbacks_total";
pub const STAGE_DURATION_SECONDS: &str = "plotwise_stage_duration_seconds";
pub const MODEL_TOKENS_TOTAL: &str = "plotwise_model_tokens_total";

/// Holds the Prometheus handle and service start time.
pub struct MetricsCollector {
    start_time: Instant,
    prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
}

impl MetricsCollector {
    pub fn new(
        start_time: Instant,
        prometheus_handle: metrics_exporter_prometheus::PrometheusHandle,
    ) -> Self {
        Self {
            start_time,
            prometheus_handle,
        }
    }

    /// Seconds since the service started.
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Render Prometheus metrics in text format.
    pub fn render_metrics(&self) -> String {
        self.prometheus_handle.render()
    }
}

/// Register help text for every pipeline metric.
pub fn describe_metrics() {
    metrics::describe_counter!(DIAGRAMS_TOTAL, "Questions finished, by terminal status");
    metrics::describe_counter!(ATTEMPTS_TOTAL, "Render attempts by engine and outcome");
    metrics::describe_counter!(
        CLASSIFIER_FALLBACKS_TOTAL,
        "Classifications replaced by the generic default"
    );
    metrics::describe_counter!(
        MODEL_TOKENS_TOTAL,
        "Prompt and completion tokens reported by model endpoints"
    );
    metrics::describe_histogram!(
        STAGE_DURATION_SECONDS,
        metrics::Unit::Seconds,
        "Duration of one pipeline stage"
    );
}

/// Count the tokens a chat reply reports for `stage`.
///
/// Endpoints that omit `usage` record nothing.
pub fn record_token_usage(stage: &'static str, response: &ChatCompletionResponse) {
    let (prompt, completion, _) = extract_tokens(response);
    if prompt > 0 {
        metrics::counter!(MODEL_TOKENS_TOTAL, "stage" => stage, "kind" => "prompt")
            .increment(u64::from(prompt));
    }
    if completion > 0 {
        metrics::counter!(MODEL_TOKENS_TOTAL, "stage" => stage, "kind" => "completion")
            .increment(u64::from(completion));
    }
}

/// Initialize Prometheus metrics exporter with custom histogram buckets.
///
/// Buckets cover fast classification calls through slow image generation:
/// [0.1, 0.25, 0.5, 1, 2.5, 5, 10, 30, 60, 120, 300] seconds.
///
/// Returns a PrometheusHandle that can be used to render metrics.
pub fn setup_metrics(
) -> Result<metrics_exporter_prometheus::PrometheusHandle, Box<dyn std::error::Error>> {
    use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};

    let duration_buckets = &[
        0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0,
    ];

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(STAGE_DURATION_SECONDS.to_string()),
            duration_buckets,
        )?
        .install_recorder()?;

    describe_metrics();
    Ok(handle)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::{Mutex, Once};

    static INIT: Once = Once::new();
    static TEST_HANDLE: Mutex<Option<metrics_exporter_prometheus::PrometheusHandle>> =
        Mutex::new(None);

    pub(crate) fn get_test_handle() -> metrics_exporter_prometheus::PrometheusHandle {
        INIT.call_once(|| {
            // Use build_recorder which doesn't need a runtime
            let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            *TEST_HANDLE.lock().unwrap() = Some(handle);

            // Install the recorder globally (only once for all tests)
            metrics::set_global_recorder(Box::new(recorder)).ok();
        });

        TEST_HANDLE.lock().unwrap().as_ref().unwrap().clone()
    }

    #[test]
    fn test_metrics_collector_construction() {
        let collector = MetricsCollector::new(Instant::now(), get_test_handle());
        assert!(collector.uptime_seconds() < 1);
    }

    #[test]
    fn test_counters_render_with_labels() {
        let collector = MetricsCollector::new(Instant::now(), get_test_handle());
        describe_metrics();

        metrics::counter!(ATTEMPTS_TOTAL, "tool" => "plot_with_code", "outcome" => "accepted")
            .increment(1);

        let text = collector.render_metrics();
        assert!(text.contains("plotwise_attempts_total"));
        assert!(text.contains("tool=\"plot_with_code\""));
        assert!(text.contains("outcome=\"accepted\""));
    }

    #[test]
    fn test_token_usage_recorded_per_stage() {
        use crate::agent::types::Usage;

        let collector = MetricsCollector::new(Instant::now(), get_test_handle());
        let mut response = ChatCompletionResponse {
            id: "chatcmpl-1".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model: "gpt-4o".to_string(),
            choices: vec![],
            usage: Some(Usage {
                prompt_tokens: 120,
                completion_tokens: 30,
                total_tokens: 150,
            }),
        };
        record_token_usage("classify", &response);
        response.usage = None;
        record_token_usage("classify", &response);

        let text = collector.render_metrics();
        assert!(text.contains("plotwise_model_tokens_total"));
        assert!(text.contains("stage=\"classify\""));
        assert!(text.contains("kind=\"completion\""));
    }
}
