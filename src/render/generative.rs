//! Generative image renderer.

use super::{drawing_rules, RenderBrief, RenderError, RenderOutput, Renderer, ToolName};
use crate::agent::{ImageGenerationRequest, ModelAgent};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub struct GenerativeRenderer {
    agent: Arc<dyn ModelAgent>,
    model: String,
    size: String,
    timeout: Duration,
}

impl GenerativeRenderer {
    pub fn new(
        agent: Arc<dyn ModelAgent>,
        model: impl Into<String>,
        size: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            agent,
            model: model.into(),
            size: size.into(),
            timeout,
        }
    }
}

/// The prompt is the source artifact for this engine.
fn image_prompt(brief: &RenderBrief) -> String {
    format!(
        "A clean, flat, textbook-style technical illustration on a plain white background. {}",
        drawing_rules(brief)
    )
}

#[async_trait]
impl Renderer for GenerativeRenderer {
    fn tool(&self) -> ToolName {
        ToolName::GenerateImage
    }

    async fn render(&self, brief: &RenderBrief) -> RenderOutput {
        let prompt = image_prompt(brief);
        let request = ImageGenerationRequest::new(self.model.clone(), prompt.clone(), self.size.clone());

        match self.agent.generate_image(request, self.timeout).await {
            Ok(bytes) if bytes.is_empty() => {
                RenderOutput::failure(prompt, RenderError::EmptyOutput("image"))
            }
            Ok(bytes) => RenderOutput::success(bytes, prompt),
            Err(e) => RenderOutput::failure(prompt, RenderError::from(e)),
        }
    }
}
