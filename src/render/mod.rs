//! Rendering engines.
//!
//! Each engine turns a [`RenderBrief`] into a [`RenderOutput`] behind the
//! [`Renderer`] trait. [`RenderEngines`] owns one engine per [`ToolName`],
//! applies the wall-clock limit and normalizes every produced image, so
//! callers only ever see a finished [`RenderAttempt`].
//!
//! Adding an engine means adding a `ToolName` variant and implementing
//! `Renderer`; callers do not change.

pub mod code;
pub mod generative;
pub mod normalize;
pub mod sandbox;
pub mod schematic;
pub mod tool;

pub use code::CodeRenderer;
pub use generative::GenerativeRenderer;
pub use normalize::{normalize_image, ImageBounds};
pub use sandbox::{Sandbox, SandboxError, SandboxJob};
pub use schematic::SchematicRenderer;
pub use tool::ToolName;

use crate::agent::AgentError;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

/// Engine-level failures. All of them end the current attempt.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("model call failed: {0}")]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Sandbox(#[from] SandboxError),

    #[error("model returned no {0}")]
    EmptyOutput(&'static str),
}

/// Input to an engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderBrief {
    pub tool_name: ToolName,
    /// Natural-language description or generation brief
    pub description_or_spec: String,
    pub domain_style_guidance: String,
    /// Source of the rejected attempt this one corrects, if any
    pub previous_artifact: Option<String>,
}

impl RenderBrief {
    pub fn new(
        tool_name: ToolName,
        description_or_spec: impl Into<String>,
        domain_style_guidance: impl Into<String>,
    ) -> Self {
        Self {
            tool_name,
            description_or_spec: description_or_spec.into(),
            domain_style_guidance: domain_style_guidance.into(),
            previous_artifact: None,
        }
    }

    pub fn with_previous_artifact(mut self, artifact: Option<String>) -> Self {
        self.previous_artifact = artifact.filter(|a| !a.trim().is_empty());
        self
    }
}

/// Output of an engine. `error` is set when the engine itself failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutput {
    pub image_bytes: Vec<u8>,
    /// Code, markup or prompt that produced (or failed to produce) the image
    pub source_artifact: String,
    pub error: Option<String>,
}

impl RenderOutput {
    pub fn success(image_bytes: Vec<u8>, source_artifact: impl Into<String>) -> Self {
        Self {
            image_bytes,
            source_artifact: source_artifact.into(),
            error: None,
        }
    }

    pub fn failure(source_artifact: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self {
            image_bytes: Vec::new(),
            source_artifact: source_artifact.into(),
            error: Some(error.to_string()),
        }
    }
}

/// One execution of one engine for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderAttempt {
    /// 1-based, counted across all engines for the question
    pub attempt_number: u32,
    pub tool_name: ToolName,
    /// Normalized PNG bytes; empty on engine error
    pub raw_output: Vec<u8>,
    pub source_artifact: String,
    pub engine_error: Option<String>,
}

impl RenderAttempt {
    pub fn from_output(attempt_number: u32, tool_name: ToolName, output: RenderOutput) -> Self {
        Self {
            attempt_number,
            tool_name,
            raw_output: output.image_bytes,
            source_artifact: output.source_artifact,
            engine_error: output.error,
        }
    }

    pub fn is_engine_error(&self) -> bool {
        self.engine_error.is_some()
    }
}

/// A rendering backend.
///
/// Implementations report failures through [`RenderOutput::error`] and keep
/// whatever source they produced so a corrected retry can build on it.
#[async_trait]
pub trait Renderer: Send + Sync + 'static {
    fn tool(&self) -> ToolName;

    async fn render(&self, brief: &RenderBrief) -> RenderOutput;
}

/// One engine per tool, plus the limits applied to all of them.
#[derive(Clone)]
pub struct RenderEngines {
    schematic: Arc<dyn Renderer>,
    code: Arc<dyn Renderer>,
    generative: Arc<dyn Renderer>,
    bounds: ImageBounds,
    timeout: Duration,
}

impl RenderEngines {
    pub fn new(
        schematic: Arc<dyn Renderer>,
        code: Arc<dyn Renderer>,
        generative: Arc<dyn Renderer>,
    ) -> Self {
        Self {
            schematic,
            code,
            generative,
            bounds: ImageBounds::default(),
            timeout: Duration::from_secs(180),
        }
    }

    pub fn with_bounds(mut self, bounds: ImageBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn engine(&self, tool: ToolName) -> &Arc<dyn Renderer> {
        match tool {
            ToolName::DrawSchematic => &self.schematic,
            ToolName::PlotWithCode => &self.code,
            ToolName::GenerateImage => &self.generative,
        }
    }

    /// Run the engine named by `brief.tool_name` and normalize its image.
    ///
    /// Timeouts and undecodable images become engine errors.
    pub async fn render(&self, brief: &RenderBrief, attempt_number: u32) -> RenderAttempt {
        let tool = brief.tool_name;
        let start = Instant::now();

        let output = match tokio::time::timeout(self.timeout, self.engine(tool).render(brief)).await
        {
            Ok(output) => output,
            Err(_) => RenderOutput::failure(
                brief.previous_artifact.clone().unwrap_or_default(),
                format!("render timed out after {}ms", self.timeout.as_millis()),
            ),
        };

        metrics::histogram!("plotwise_stage_duration_seconds", "stage" => "render")
            .record(start.elapsed().as_secs_f64());

        let output = match output.error {
            Some(_) => output,
            None => match normalize_image(&output.image_bytes, self.bounds) {
                Ok(png) => RenderOutput::success(png, output.source_artifact),
                Err(e) => RenderOutput::failure(output.source_artifact, e),
            },
        };

        match &output.error {
            Some(error) => warn!(
                tool = %tool,
                attempt = attempt_number,
                elapsed_ms = start.elapsed().as_millis() as u64,
                error = %error,
                "Engine error"
            ),
            None => debug!(
                tool = %tool,
                attempt = attempt_number,
                elapsed_ms = start.elapsed().as_millis() as u64,
                image_bytes = output.image_bytes.len(),
                "Engine produced image"
            ),
        }

        RenderAttempt::from_output(attempt_number, tool, output)
    }
}

/// Prompt lines shared by every engine: what to draw and what never to show.
pub(crate) fn drawing_rules(brief: &RenderBrief) -> String {
    format!(
        "Figure to draw:\n{}\n\nStyle:\n{}\n\nRules: label every given quantity with its symbol and value; \
         never show the quantity the student must find, its value, or any worked result; \
         keep text legible and non-overlapping; keep the figure compact and roughly square.",
        brief.description_or_spec.trim(),
        brief.domain_style_guidance.trim()
    )
}
