//! Vector/schematic renderer: model-written markup compiled to raster.

use super::code::{request_source, source_prompt};
use super::sandbox::{Sandbox, SandboxJob};
use super::{RenderBrief, RenderError, RenderOutput, Renderer, ToolName};
use crate::agent::ModelAgent;
use crate::config::MarkupCompilerConfig;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const OUTPUT_FILE: &str = "diagram.png";

pub struct SchematicRenderer {
    agent: Arc<dyn ModelAgent>,
    model: String,
    model_timeout: Duration,
    compiler: MarkupCompilerConfig,
    sandbox: Sandbox,
}

impl SchematicRenderer {
    pub fn new(
        agent: Arc<dyn ModelAgent>,
        model: impl Into<String>,
        model_timeout: Duration,
        compiler: MarkupCompilerConfig,
        sandbox: Sandbox,
    ) -> Self {
        Self {
            agent,
            model: model.into(),
            model_timeout,
            compiler,
            sandbox,
        }
    }

    fn system_prompt(&self) -> String {
        format!(
            "You write {dialect} source for a technical schematic. Use the standard symbols and \
             conventions of the subject, label every component with its designator and value, \
             and lay the drawing out compactly. The source is compiled to a PNG without any \
             other input. Reply with the {dialect} source only, in one fenced code block.",
            dialect = self.compiler.dialect
        )
    }
}

#[async_trait]
impl Renderer for SchematicRenderer {
    fn tool(&self) -> ToolName {
        ToolName::DrawSchematic
    }

    async fn render(&self, brief: &RenderBrief) -> RenderOutput {
        let markup = match request_source(
            self.agent.as_ref(),
            &self.model,
            self.model_timeout,
            &self.system_prompt(),
            source_prompt(brief, &self.compiler.dialect),
        )
        .await
        {
            Ok(markup) => markup,
            Err(e) => {
                return RenderOutput::failure(brief.previous_artifact.clone().unwrap_or_default(), e)
            }
        };

        let job = SandboxJob {
            program: &self.compiler.program,
            args: &self.compiler.args,
            source_file: &self.compiler.source_file,
            source: &markup,
            output_file: OUTPUT_FILE,
        };
        match self.sandbox.run(&job).await {
            Ok(bytes) => RenderOutput::success(bytes, markup),
            Err(e) => RenderOutput::failure(markup, RenderError::from(e)),
        }
    }
}
