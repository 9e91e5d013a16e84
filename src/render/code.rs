//! Code-generation renderer: model-written plotting code run in the sandbox.

use super::sandbox::{Sandbox, SandboxJob};
use super::{drawing_rules, RenderBrief, RenderError, RenderOutput, Renderer, ToolName};
use crate::agent::parse::extract_source;
use crate::agent::{ChatCompletionRequest, ChatMessage, ModelAgent};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

const SOURCE_FILE: &str = "figure.py";
const OUTPUT_FILE: &str = "figure.png";

const SYSTEM_PROMPT: &str = "You write one self-contained Python 3 script that draws a technical \
figure with matplotlib (networkx and numpy are also available). The script must save the figure \
with plt.savefig('figure.png', dpi=150, bbox_inches='tight') in the current directory, must not \
call plt.show(), must not read files or use the network, and must print nothing. Use a white \
background and a square-ish figure size such as figsize=(6, 6). Reply with the script only, in \
one fenced code block.";

/// Model call shared by the code and schematic engines.
pub(crate) async fn request_source(
    agent: &dyn ModelAgent,
    model: &str,
    timeout: Duration,
    system: &str,
    user: String,
) -> Result<String, RenderError> {
    let request = ChatCompletionRequest::new(
        model,
        vec![ChatMessage::system(system), ChatMessage::user(user)],
    )
    .with_temperature(0.2);

    let response = agent.chat_completion(request, timeout).await?;
    crate::metrics::record_token_usage("codegen", &response);
    let text = response
        .first_text()
        .ok_or(RenderError::EmptyOutput("source code"))?;
    let source = extract_source(&text);
    if source.is_empty() {
        return Err(RenderError::EmptyOutput("source code"));
    }
    Ok(source.to_string())
}

/// User prompt for a code engine, including the previous attempt's source
/// when this attempt is a correction.
pub(crate) fn source_prompt(brief: &RenderBrief, language: &str) -> String {
    let mut prompt = drawing_rules(brief);
    if let Some(previous) = &brief.previous_artifact {
        prompt.push_str(&format!(
            "\n\nA previous {} attempt was rejected. Revise it so that it matches the figure \
             description above:\n```\n{}\n```",
            language, previous
        ));
    }
    prompt
}

pub struct CodeRenderer {
    agent: Arc<dyn ModelAgent>,
    model: String,
    model_timeout: Duration,
    python: String,
    sandbox: Sandbox,
}

impl CodeRenderer {
    pub fn new(
        agent: Arc<dyn ModelAgent>,
        model: impl Into<String>,
        model_timeout: Duration,
        python: impl Into<String>,
        sandbox: Sandbox,
    ) -> Self {
        Self {
            agent,
            model: model.into(),
            model_timeout,
            python: python.into(),
            sandbox,
        }
    }
}

#[async_trait]
impl Renderer for CodeRenderer {
    fn tool(&self) -> ToolName {
        ToolName::PlotWithCode
    }

    async fn render(&self, brief: &RenderBrief) -> RenderOutput {
        let source = match request_source(
            self.agent.as_ref(),
            &self.model,
            self.model_timeout,
            SYSTEM_PROMPT,
            source_prompt(brief, "Python"),
        )
        .await
        {
            Ok(source) => source,
            Err(e) => {
                return RenderOutput::failure(brief.previous_artifact.clone().unwrap_or_default(), e)
            }
        };

        let args = ["{input}".to_string()];
        let job = SandboxJob {
            program: &self.python,
            args: &args,
            source_file: SOURCE_FILE,
            source: &source,
            output_file: OUTPUT_FILE,
        };
        match self.sandbox.run(&job).await {
            Ok(bytes) => RenderOutput::success(bytes, source),
            Err(e) => RenderOutput::failure(source, RenderError::from(e)),
        }
    }
}
