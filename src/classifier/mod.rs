//! Domain classifier.
//!
//! One cheap JSON-mode model call per question. Every failure path (timeout,
//! endpoint error, unparseable reply, label outside the taxonomy) degrades to
//! [`Classification::fallback`]; `classify` never returns an error.

use crate::agent::parse::extract_json_object;
use crate::agent::{AgentError, ChatCompletionRequest, ChatMessage, ModelAgent};
use crate::logging::ContentLogging;
use crate::question::QuestionHints;
use crate::taxonomy::{Classification, Complexity, DiagramType, Domain};
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
enum ClassifyError {
    #[error("classification timed out after {0}ms")]
    Timeout(u64),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("malformed classification: {0}")]
    Malformed(String),
}

/// Labels as the model emits them, before taxonomy checks.
#[derive(Debug, Deserialize)]
struct RawClassification {
    domain: String,
    #[serde(default)]
    diagram_type: Option<String>,
    #[serde(default)]
    complexity: Option<String>,
    #[serde(default)]
    generative_suitable: Option<bool>,
}

pub struct DomainClassifier {
    agent: Arc<dyn ModelAgent>,
    model: String,
    timeout: Duration,
    content_logging: ContentLogging,
}

impl DomainClassifier {
    pub fn new(agent: Arc<dyn ModelAgent>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent,
            model: model.into(),
            timeout,
            content_logging: ContentLogging::disabled(),
        }
    }

    pub fn with_content_logging(mut self, content_logging: ContentLogging) -> Self {
        self.content_logging = content_logging;
        self
    }

    /// Label a question with a taxonomy pair, complexity and generative suitability.
    pub async fn classify(&self, question_text: &str, subject_hint: Option<&str>) -> Classification {
        self.classify_with_hints(question_text, subject_hint, &QuestionHints::default())
            .await
    }

    /// Like [`classify`](Self::classify), with the question record's advisory hints.
    pub async fn classify_with_hints(
        &self,
        question_text: &str,
        subject_hint: Option<&str>,
        hints: &QuestionHints,
    ) -> Classification {
        let start = Instant::now();
        let result = self.try_classify(question_text, subject_hint, hints).await;
        metrics::histogram!("plotwise_stage_duration_seconds", "stage" => "classify")
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(classification) => {
                debug!(
                    domain = %classification.domain,
                    diagram_type = %classification.diagram_type,
                    generative_suitable = classification.generative_suitable,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Question classified"
                );
                classification
            }
            Err(e) => {
                warn!(
                    error = %e,
                    question_preview = ?self.content_logging.preview(question_text),
                    "Classification failed, using generic default"
                );
                metrics::counter!("plotwise_classifier_fallbacks_total").increment(1);
                Classification::fallback()
            }
        }
    }

    async fn try_classify(
        &self,
        question_text: &str,
        subject_hint: Option<&str>,
        hints: &QuestionHints,
    ) -> Result<Classification, ClassifyError> {
        let request = ChatCompletionRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(system_prompt()),
                ChatMessage::user(user_prompt(question_text, subject_hint, hints)),
            ],
        )
        .with_temperature(0.0)
        .with_max_tokens(200)
        .with_json_mode();

        let response = tokio::time::timeout(
            self.timeout,
            self.agent.chat_completion(request, self.timeout),
        )
        .await
        .map_err(|_| ClassifyError::Timeout(self.timeout.as_millis() as u64))??;
        crate::metrics::record_token_usage("classify", &response);

        let text = response
            .first_text()
            .ok_or_else(|| ClassifyError::Malformed("empty reply".to_string()))?;
        parse_classification(&text).map_err(ClassifyError::Malformed)
    }
}

fn system_prompt() -> String {
    let mut prompt = String::from(
        "You label exam questions so a diagram pipeline can route them. \
         Reply with a single JSON object with keys \"domain\", \"diagram_type\", \
         \"complexity\" (simple, moderate or complex) and \"generative_suitable\" \
         (true when an image generation model can draw it well, false when exact \
         plotting or graph-layout code is needed, e.g. precise function plots, trees, \
         graphs, timing diagrams).\n\nAllowed domains and their diagram types:\n",
    );
    for domain in Domain::ALL {
        if domain == Domain::Unknown {
            continue;
        }
        let types: Vec<&str> = domain.diagram_types().iter().map(|t| t.as_str()).collect();
        prompt.push_str(&format!("- {}: {}\n", domain.as_str(), types.join(", ")));
    }
    prompt.push_str(
        "\nIf no listed type fits, use diagram_type \"generic\". \
         If no domain fits, use domain \"unknown\".",
    );
    prompt
}

fn user_prompt(question_text: &str, subject_hint: Option<&str>, hints: &QuestionHints) -> String {
    let mut prompt = format!("Question:\n{}", question_text.trim());
    if let Some(subject) = subject_hint.filter(|s| !s.trim().is_empty()) {
        prompt.push_str(&format!("\n\nCourse subject: {}", subject.trim()));
    }
    if let Some(caption) = hints.caption.as_deref().filter(|c| !c.trim().is_empty()) {
        prompt.push_str(&format!("\nIntended figure caption: {}", caption.trim()));
    }
    if hints.diagram_needed {
        prompt.push_str("\nThe author expects this question to have a figure.");
    }
    prompt
}

/// Map a model reply onto the taxonomy.
///
/// An unknown domain is malformed. An unknown or mismatched diagram type keeps
/// the domain and becomes `generic`. Missing suitability follows the diagram
/// type's renderer preference.
pub(crate) fn parse_classification(text: &str) -> Result<Classification, String> {
    let json = extract_json_object(text).ok_or_else(|| "no JSON object in reply".to_string())?;
    let raw: RawClassification = serde_json::from_str(json).map_err(|e| e.to_string())?;

    let domain: Domain = raw.domain.parse()?;
    let complexity = raw
        .complexity
        .as_deref()
        .and_then(|c| c.parse().ok())
        .unwrap_or(Complexity::Moderate);

    let diagram_type = match raw.diagram_type.as_deref().map(str::parse::<DiagramType>) {
        Some(Ok(t)) => t,
        _ => return Ok(Classification::generic(domain, complexity)),
    };
    let generative_suitable = raw
        .generative_suitable
        .unwrap_or(!diagram_type.prefers_code());

    Ok(Classification::new(
        domain,
        diagram_type,
        complexity,
        generative_suitable,
    ))
}
