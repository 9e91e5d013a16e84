//! Tool selection agent.
//!
//! A tool-calling model decides whether a figure adds value and which
//! renderer should draw it. The renderers it may name come from
//! [`composer::engine_order`], so a classification that rules out the
//! generative engine never offers it, and a reply naming it anyway is
//! coerced to the first code-based engine.

use crate::agent::{ChatCompletionRequest, ChatMessage, ModelAgent, ToolDefinition};
use crate::composer::{self, ComposedGuidance};
use crate::logging::ContentLogging;
use crate::question::DiagramRequest;
use crate::render::ToolName;
use crate::taxonomy::Classification;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Name of the pseudo-tool the model calls to decline drawing.
pub const SKIP_TOOL: &str = "skip_diagram";

/// Output of the selection agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDecision {
    pub should_generate: bool,
    /// Set exactly when `should_generate` is true
    pub tool_name: Option<ToolName>,
    pub description_or_spec: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ToolDecision {
    pub fn generate(tool_name: ToolName, description_or_spec: impl Into<String>) -> Self {
        Self {
            should_generate: true,
            tool_name: Some(tool_name),
            description_or_spec: description_or_spec.into(),
            reason: None,
        }
    }

    pub fn skip(reason: impl Into<String>) -> Self {
        Self {
            should_generate: false,
            tool_name: None,
            description_or_spec: String::new(),
            reason: Some(reason.into()),
        }
    }

    fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason.filter(|r| !r.trim().is_empty());
        self
    }
}

#[derive(Debug, Default, Deserialize)]
struct ToolArguments {
    #[serde(default, alias = "description_or_spec", alias = "spec")]
    description: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

pub struct ToolSelector {
    agent: Arc<dyn ModelAgent>,
    model: String,
    timeout: Duration,
    content_logging: ContentLogging,
    generative_available: bool,
}

impl ToolSelector {
    pub fn new(agent: Arc<dyn ModelAgent>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent,
            model: model.into(),
            timeout,
            content_logging: ContentLogging::disabled(),
            generative_available: true,
        }
    }

    /// Never offer the generative engine, whatever the classification says.
    pub fn without_generative(mut self) -> Self {
        self.generative_available = false;
        self
    }

    pub fn with_content_logging(mut self, content_logging: ContentLogging) -> Self {
        self.content_logging = content_logging;
        self
    }

    /// Decide whether and how to draw a figure for `request`.
    ///
    /// Never fails: an unusable reply falls back to drawing with the first
    /// allowed engine from the question text.
    pub async fn select_tool(
        &self,
        request: &DiagramRequest,
        classification: &Classification,
        guidance: &ComposedGuidance,
    ) -> ToolDecision {
        let mut allowed = composer::engine_order(classification, request.engine_preference);
        if !self.generative_available {
            allowed.retain(|t| *t != ToolName::GenerateImage);
        }
        let start = Instant::now();

        let chat = ChatCompletionRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(system_prompt(guidance)),
                ChatMessage::user(user_prompt(request, classification)),
            ],
        )
        .with_temperature(0.2)
        .with_required_tools(tool_definitions(&allowed));

        let reply = tokio::time::timeout(self.timeout, self.agent.chat_completion(chat, self.timeout)).await;
        metrics::histogram!("plotwise_stage_duration_seconds", "stage" => "select")
            .record(start.elapsed().as_secs_f64());

        let decision = match reply {
            Ok(Ok(response)) => {
                crate::metrics::record_token_usage("select", &response);
                let call = response
                    .first_message()
                    .and_then(|m| m.tool_calls.first())
                    .map(|c| (c.function.name.clone(), c.function.arguments.clone()));
                match call {
                    Some((name, arguments)) => decide(&name, &arguments, &allowed, request),
                    None => {
                        warn!(
                            question_id = %request.question_id,
                            "Selection reply had no tool call, drawing with default engine"
                        );
                        default_decision(&allowed, request)
                    }
                }
            }
            Ok(Err(e)) => {
                warn!(
                    question_id = %request.question_id,
                    error = %e,
                    "Tool selection failed, drawing with default engine"
                );
                default_decision(&allowed, request)
            }
            Err(_) => {
                warn!(
                    question_id = %request.question_id,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Tool selection timed out, drawing with default engine"
                );
                default_decision(&allowed, request)
            }
        };

        debug!(
            question_id = %request.question_id,
            should_generate = decision.should_generate,
            tool = ?decision.tool_name,
            description_preview = ?self.content_logging.preview(&decision.description_or_spec),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Tool selected"
        );
        decision
    }
}

/// Turn one tool call into a decision, enforcing the allowed engine set.
fn decide(name: &str, arguments: &str, allowed: &[ToolName], request: &DiagramRequest) -> ToolDecision {
    let args: ToolArguments = serde_json::from_str(arguments).unwrap_or_default();

    if name == SKIP_TOOL {
        return ToolDecision::skip(args.reason.unwrap_or_else(|| "not useful".to_string()));
    }

    let requested = name.parse::<ToolName>().ok();
    let tool = match requested {
        Some(tool) if allowed.contains(&tool) => tool,
        _ => {
            let Some(first) = allowed.first().copied() else {
                return ToolDecision::skip("no engine available");
            };
            warn!(
                question_id = %request.question_id,
                requested = name,
                using = %first,
                "Selection named a tool outside the allowed set"
            );
            first
        }
    };

    let description = args
        .description
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| request.question_text.clone());
    ToolDecision::generate(tool, description).with_reason(args.reason)
}

fn default_decision(allowed: &[ToolName], request: &DiagramRequest) -> ToolDecision {
    match allowed.first() {
        Some(tool) => ToolDecision::generate(*tool, request.question_text.clone())
            .with_reason(Some("selection unavailable".to_string())),
        None => ToolDecision::skip("no engine available"),
    }
}

fn tool_definitions(allowed: &[ToolName]) -> Vec<ToolDefinition> {
    let mut tools: Vec<ToolDefinition> = allowed
        .iter()
        .map(|tool| {
            ToolDefinition::function(
                tool.as_str(),
                tool.description(),
                json!({
                    "type": "object",
                    "properties": {
                        "description": {
                            "type": "string",
                            "description": "Complete brief for the renderer: every object, quantity and label to draw. Never include the value the student must find."
                        },
                        "reason": {
                            "type": "string",
                            "description": "Why this renderer fits."
                        }
                    },
                    "required": ["description"]
                }),
            )
        })
        .collect();

    tools.push(ToolDefinition::function(
        SKIP_TOOL,
        "Call when a figure would not help a student answer this question.",
        json!({
            "type": "object",
            "properties": {
                "reason": { "type": "string" }
            },
            "required": ["reason"]
        }),
    ));
    tools
}

fn system_prompt(guidance: &ComposedGuidance) -> String {
    format!(
        "You decide whether an exam question needs an illustrative figure and, if so, which \
         renderer should draw it. Call exactly one tool. Tools are listed in order of preference \
         for this kind of question. Subject guidance: {}",
        guidance.agent
    )
}

fn user_prompt(request: &DiagramRequest, classification: &Classification) -> String {
    let mut prompt = format!(
        "Question:\n{}\n\nClassified as {} / {} ({:?} complexity).",
        request.question_text.trim(),
        classification.domain,
        classification.diagram_type,
        classification.complexity
    );
    if let Some(subject) = request.subject_hint.as_deref() {
        prompt.push_str(&format!("\nCourse subject: {}", subject));
    }
    prompt
}
