//! Per-question orchestrator.
//!
//! [`DiagramPipeline::process`] runs classify → compose → select → the
//! render/review loop → publish, and always returns a [`DiagramResult`].
//! Only construction can fail.

pub mod batch;

pub use batch::{run_batch, BatchReport};

use crate::agent::factory::create_agents;
use crate::agent::{AgentError, ModelAgent};
use crate::classifier::DomainClassifier;
use crate::composer;
use crate::config::{ConfigError, PlotwiseConfig};
use crate::logging::ContentLogging;
use crate::question::{DiagramRequest, DiagramResult};
use crate::render::{
    CodeRenderer, GenerativeRenderer, ImageBounds, RenderBrief, RenderEngines, Sandbox,
    SchematicRenderer, ToolName,
};
use crate::review::{AttemptOutcome, RetryController, RetryState, Reviewer};
use crate::selection::{ToolDecision, ToolSelector};
use crate::storage::{create_store, object_key, ObjectStore, StorageError};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Longest caption derived from a tool description.
pub const MAX_CAPTION_CHARS: usize = 120;

/// Errors building a pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Model endpoint setup failed: {0}")]
    Agent(#[from] AgentError),

    #[error("Object store setup failed: {0}")]
    Storage(#[from] StorageError),

    #[error("Unknown model endpoint '{0}'")]
    UnknownEndpoint(String),

    #[error("Guidance registry check failed: {0}")]
    Registry(String),

    #[error("Endpoint '{endpoint}' for {stage} lacks {capability} support")]
    MissingCapability {
        stage: &'static str,
        endpoint: String,
        capability: &'static str,
    },
}

pub struct DiagramPipeline {
    classifier: DomainClassifier,
    selector: ToolSelector,
    engines: RenderEngines,
    reviewer: Reviewer,
    store: Arc<dyn ObjectStore>,
    max_attempts: u32,
    publish_timeout: Duration,
    key_prefix: String,
    generative_available: bool,
}

impl DiagramPipeline {
    pub fn new(
        classifier: DomainClassifier,
        selector: ToolSelector,
        engines: RenderEngines,
        reviewer: Reviewer,
        store: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            classifier,
            selector,
            engines,
            reviewer,
            store,
            max_attempts: 3,
            publish_timeout: Duration::from_secs(30),
            key_prefix: "diagrams".to_string(),
            generative_available: true,
        }
    }

    /// Drop the generative engine from every question's fallback order.
    pub fn without_generative(mut self) -> Self {
        self.generative_available = false;
        self.selector = self.selector.without_generative();
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_publish_timeout(mut self, timeout: Duration) -> Self {
        self.publish_timeout = timeout;
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Build agents and the object store from config, then the pipeline.
    pub fn from_config(config: &PlotwiseConfig, client: Arc<Client>) -> Result<Self, PipelineError> {
        config.validate()?;
        let agents = create_agents(&config.endpoints, client.clone())?;
        let store = create_store(&config.storage, client)?;
        Self::from_parts(config, &agents, store)
    }

    /// Build the pipeline from already-constructed agents (keyed by endpoint
    /// name) and store.
    pub fn from_parts(
        config: &PlotwiseConfig,
        agents: &HashMap<String, Arc<dyn ModelAgent>>,
        store: Arc<dyn ObjectStore>,
    ) -> Result<Self, PipelineError> {
        composer::verify_registry().map_err(PipelineError::Registry)?;

        let agent = |name: &str| {
            agents
                .get(name)
                .cloned()
                .ok_or_else(|| PipelineError::UnknownEndpoint(name.to_string()))
        };
        let models = &config.models;
        let content_logging = ContentLogging::from_config(&config.logging);

        let classifier = DomainClassifier::new(
            agent(&models.classifier.endpoint)?,
            models.classifier.model.clone(),
            secs(models.classifier.timeout_seconds),
        )
        .with_content_logging(content_logging);

        let selector = ToolSelector::new(
            agent(&models.selector.endpoint)?,
            models.selector.model.clone(),
            secs(models.selector.timeout_seconds),
        )
        .with_content_logging(content_logging);

        let reviewer_agent = agent(&models.reviewer.endpoint)?;
        if !reviewer_agent.profile().capabilities.vision {
            return Err(PipelineError::MissingCapability {
                stage: "reviewer",
                endpoint: models.reviewer.endpoint.clone(),
                capability: "vision",
            });
        }

        let image_agent = agent(&models.image.endpoint)?;
        let generative_available = image_agent.profile().capabilities.image_generation;
        if !generative_available {
            warn!(
                endpoint = %models.image.endpoint,
                "Image endpoint cannot generate images, generative engine disabled"
            );
        }

        let codegen = agent(&models.codegen.endpoint)?;
        let sandbox = Sandbox::new(secs(config.sandbox.timeout_seconds));
        let engines = RenderEngines::new(
            Arc::new(SchematicRenderer::new(
                codegen.clone(),
                models.codegen.model.clone(),
                secs(models.codegen.timeout_seconds),
                config.sandbox.schematic.clone(),
                sandbox.clone(),
            )),
            Arc::new(CodeRenderer::new(
                codegen,
                models.codegen.model.clone(),
                secs(models.codegen.timeout_seconds),
                config.sandbox.python.clone(),
                sandbox,
            )),
            Arc::new(GenerativeRenderer::new(
                image_agent,
                models.image.model.clone(),
                models.image.size.clone(),
                secs(models.image.timeout_seconds),
            )),
        )
        .with_bounds(ImageBounds::from_config(&config.sandbox))
        .with_timeout(secs(config.pipeline.render_timeout_seconds));

        let reviewer = Reviewer::new(
            reviewer_agent,
            models.reviewer.model.clone(),
            secs(models.reviewer.timeout_seconds),
        )
        .with_content_logging(content_logging);

        let pipeline = Self::new(classifier, selector, engines, reviewer, store)
            .with_max_attempts(config.pipeline.max_attempts)
            .with_publish_timeout(secs(config.pipeline.publish_timeout_seconds))
            .with_key_prefix(config.pipeline.key_prefix.clone());
        Ok(if generative_available {
            pipeline
        } else {
            pipeline.without_generative()
        })
    }

    /// Engines questions may be drawn with, in declaration order.
    pub fn available_engines(&self) -> Vec<ToolName> {
        ToolName::ALL
            .iter()
            .copied()
            .filter(|t| self.generative_available || *t != ToolName::GenerateImage)
            .collect()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn store_name(&self) -> &str {
        self.store.name()
    }

    /// Run one question to a terminal result. Never fails.
    ///
    /// Cancellation is checked before every attempt; a stage already running
    /// is allowed to finish.
    pub async fn process(&self, request: &DiagramRequest, cancel: &CancellationToken) -> DiagramResult {
        let start = Instant::now();
        let result = self.run(request, cancel).await;

        metrics::counter!("plotwise_diagrams_total", "status" => result.status().as_str())
            .increment(1);
        info!(
            question_id = %request.question_id,
            status = %result.status(),
            attempts = result.attempts_used(),
            tool = ?result.final_tool(),
            storage_key = ?result.storage_key(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Question finished"
        );
        result
    }

    async fn run(&self, request: &DiagramRequest, cancel: &CancellationToken) -> DiagramResult {
        if cancel.is_cancelled() {
            debug!(question_id = %request.question_id, "Cancelled before start");
            return DiagramResult::exhausted(&request.question_id, 0, None);
        }

        let classification = self
            .classifier
            .classify_with_hints(
                &request.question_text,
                request.subject_hint.as_deref(),
                &request.hints,
            )
            .await;
        let guidance = composer::compose(&classification, &request.hints);
        let decision = self
            .selector
            .select_tool(request, &classification, &guidance)
            .await;

        let first_tool = match decision.tool_name {
            Some(tool) if decision.should_generate => tool,
            _ => {
                debug!(
                    question_id = %request.question_id,
                    reason = ?decision.reason,
                    "No diagram needed"
                );
                return DiagramResult::not_needed(&request.question_id);
            }
        };

        let mut order = composer::engine_order(&classification, request.engine_preference);
        if !self.generative_available {
            order.retain(|t| *t != ToolName::GenerateImage);
        }
        let mut controller = RetryController::new(
            first_tool,
            decision.description_or_spec.clone(),
            order,
            self.max_attempts,
        );

        loop {
            let (tool, attempt, description, previous_artifact) = match controller.state() {
                RetryState::Attempting {
                    tool,
                    attempt,
                    description,
                    previous_artifact,
                    ..
                } => (*tool, *attempt, description.clone(), previous_artifact.clone()),
                _ => break,
            };

            if cancel.is_cancelled() {
                info!(
                    question_id = %request.question_id,
                    attempts = controller.attempts_used(),
                    "Cancelled before next attempt"
                );
                controller.cancel();
                break;
            }

            let brief = RenderBrief::new(tool, description, guidance.style.clone())
                .with_previous_artifact(previous_artifact);
            let rendered = self.engines.render(&brief, attempt).await;

            let verdict = if rendered.is_engine_error() {
                None
            } else {
                Some(
                    self.reviewer
                        .review(&request.question_text, &rendered, &guidance.reviewer)
                        .await,
                )
            };
            let outcome = AttemptOutcome::from_attempt(&rendered, verdict.as_ref());

            metrics::counter!(
                "plotwise_attempts_total",
                "tool" => tool.as_str(),
                "outcome" => outcome.label()
            )
            .increment(1);
            debug!(
                question_id = %request.question_id,
                tool = %tool,
                attempt,
                outcome = outcome.label(),
                "Attempt finished"
            );

            controller.on_outcome(outcome, &rendered.source_artifact);
            if let RetryState::Accepted {
                tool,
                attempts_used,
            } = *controller.state()
            {
                return self
                    .publish(request, &decision, rendered.raw_output, tool, attempts_used)
                    .await;
            }
        }

        match *controller.state() {
            RetryState::Exhausted { attempts_used, .. }
            | RetryState::Cancelled { attempts_used, .. } => {
                DiagramResult::exhausted(&request.question_id, attempts_used, None)
            }
            // The loop only exits on a non-accepted terminal state.
            _ => DiagramResult::exhausted(&request.question_id, controller.attempts_used(), None),
        }
    }

    /// Upload an accepted image once. A failed upload leaves the question
    /// without a diagram.
    async fn publish(
        &self,
        request: &DiagramRequest,
        decision: &ToolDecision,
        image: Vec<u8>,
        tool: ToolName,
        attempts_used: u32,
    ) -> DiagramResult {
        let key = object_key(&self.key_prefix, &request.question_id);
        let caption = caption_for(request.hints.caption.as_deref(), &decision.description_or_spec);

        match tokio::time::timeout(self.publish_timeout, self.store.upload(image, &key)).await {
            Ok(Ok(storage_key)) => DiagramResult::attached(
                &request.question_id,
                storage_key,
                attempts_used,
                tool,
                caption,
            ),
            Ok(Err(e)) => {
                warn!(
                    question_id = %request.question_id,
                    store = self.store.name(),
                    key = %key,
                    error = %e,
                    "Publish failed"
                );
                DiagramResult::exhausted(&request.question_id, attempts_used, Some(tool))
            }
            Err(_) => {
                warn!(
                    question_id = %request.question_id,
                    store = self.store.name(),
                    key = %key,
                    timeout_ms = self.publish_timeout.as_millis() as u64,
                    "Publish timed out"
                );
                DiagramResult::exhausted(&request.question_id, attempts_used, Some(tool))
            }
        }
    }
}

fn secs(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}

/// Caption from the record's hint, else the first sentence of the description.
pub fn caption_for(hint: Option<&str>, description: &str) -> String {
    if let Some(hint) = hint.map(str::trim).filter(|h| !h.is_empty()) {
        return hint.to_string();
    }
    let description = description.trim();
    let end = description
        .char_indices()
        .find(|&(i, c)| {
            c == '\n'
                || (matches!(c, '.' | '!' | '?')
                    && description[i + c.len_utf8()..]
                        .chars()
                        .next()
                        .map_or(true, char::is_whitespace))
        })
        .map(|(i, c)| if c == '\n' { i } else { i + c.len_utf8() })
        .unwrap_or(description.len());

    description[..end]
        .trim()
        .chars()
        .take(MAX_CAPTION_CHARS)
        .collect::<String>()
        .trim_end()
        .to_string()
}
