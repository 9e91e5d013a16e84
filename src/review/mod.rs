//! Visual review of rendered figures.
//!
//! The reviewer sends the image and the question to a vision model with a
//! fixed rubric, checked in order of severity: answer leakage, label
//! completeness, technical plausibility, readability. Its verdict drives the
//! [`RetryController`].

pub mod controller;

pub use controller::{AttemptOutcome, RetryController, RetryState};

use crate::agent::parse::extract_json_object;
use crate::agent::{ChatCompletionRequest, ChatMessage, ContentPart, ModelAgent};
use crate::logging::ContentLogging;
use crate::render::RenderAttempt;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Which rubric item a rejection is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewIssue {
    AnswerLeakage,
    MissingLabels,
    Implausible,
    Unreadable,
}

impl ReviewIssue {
    fn parse_lenient(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase().replace([' ', '-'], "_");
        if s.contains("leak") || s.contains("reveal") {
            return Some(ReviewIssue::AnswerLeakage);
        }
        match s.as_str() {
            "missing_labels" | "label_completeness" | "labels" => Some(ReviewIssue::MissingLabels),
            "implausible" | "technical_plausibility" | "plausibility" => {
                Some(ReviewIssue::Implausible)
            }
            "unreadable" | "readability" => Some(ReviewIssue::Unreadable),
            _ => None,
        }
    }
}

/// Outcome of reviewing one attempt.
///
/// Invariants: a rejection always has a reason; `corrected_description` is
/// present exactly when `fixable`; a leakage finding is never fixable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewVerdict {
    pub accepted: bool,
    pub reason: Option<String>,
    pub fixable: bool,
    pub corrected_description: Option<String>,
    pub issue: Option<ReviewIssue>,
}

impl ReviewVerdict {
    pub fn accept() -> Self {
        Self {
            accepted: true,
            reason: None,
            fixable: false,
            corrected_description: None,
            issue: None,
        }
    }

    pub fn reject_fixable(
        issue: Option<ReviewIssue>,
        reason: impl Into<String>,
        corrected_description: impl Into<String>,
    ) -> Self {
        Self::normalized(false, Some(reason.into()), true, Some(corrected_description.into()), issue)
    }

    pub fn reject_hard(issue: Option<ReviewIssue>, reason: impl Into<String>) -> Self {
        Self::normalized(false, Some(reason.into()), false, None, issue)
    }

    pub fn is_leakage(&self) -> bool {
        !self.accepted && self.issue == Some(ReviewIssue::AnswerLeakage)
    }

    fn normalized(
        accepted: bool,
        reason: Option<String>,
        fixable: bool,
        corrected_description: Option<String>,
        issue: Option<ReviewIssue>,
    ) -> Self {
        if accepted {
            return Self::accept();
        }
        let reason = reason
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| "unspecified".to_string());
        let corrected_description = corrected_description.filter(|d| !d.trim().is_empty());
        let fixable =
            fixable && corrected_description.is_some() && issue != Some(ReviewIssue::AnswerLeakage);
        Self {
            accepted: false,
            reason: Some(reason),
            corrected_description: if fixable { corrected_description } else { None },
            fixable,
            issue,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    accepted: bool,
    #[serde(default)]
    issue: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    fixable: bool,
    #[serde(default)]
    corrected_description: Option<String>,
}

/// Parse the reviewer's JSON reply.
pub(crate) fn parse_verdict(text: &str) -> Result<ReviewVerdict, String> {
    let json = extract_json_object(text).ok_or_else(|| "no JSON object in reply".to_string())?;
    let raw: RawVerdict = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let issue = raw.issue.as_deref().and_then(ReviewIssue::parse_lenient);
    Ok(ReviewVerdict::normalized(
        raw.accepted,
        raw.reason,
        raw.fixable,
        raw.corrected_description,
        issue,
    ))
}

const RUBRIC: &str = "You review figures drawn for exam questions. Check, in this order:\n\
1. answer_leakage: the figure must not show the value or result the student is asked to find \
(e.g. printed totals, computed areas, solved unknowns). Any leakage is a rejection that is not \
fixable.\n\
2. missing_labels: every quantity given in the question with a symbol or value must appear \
labeled in the figure.\n\
3. implausible: the figure must be technically correct and follow the subject's conventions.\n\
4. unreadable: text must not overlap and nothing may be cut off.\n\
Reply with one JSON object: {\"accepted\": bool, \"issue\": one of the four names or null, \
\"reason\": string, \"fixable\": bool, \"corrected_description\": string or null}. Set fixable \
to true only if redrawing from a corrected description with the same method would fix the \
problem, and then give the full corrected description.";

pub struct Reviewer {
    agent: Arc<dyn ModelAgent>,
    model: String,
    timeout: Duration,
    content_logging: ContentLogging,
}

impl Reviewer {
    pub fn new(agent: Arc<dyn ModelAgent>, model: impl Into<String>, timeout: Duration) -> Self {
        Self {
            agent,
            model: model.into(),
            timeout,
            content_logging: ContentLogging::disabled(),
        }
    }

    /// Verdict reasons can restate the answer, so they are logged only
    /// through this guard.
    pub fn with_content_logging(mut self, content_logging: ContentLogging) -> Self {
        self.content_logging = content_logging;
        self
    }

    fn reason_preview(&self, verdict: &ReviewVerdict) -> Option<String> {
        verdict
            .reason
            .as_deref()
            .and_then(|reason| self.content_logging.preview(reason))
    }

    /// Review one rendered attempt.
    ///
    /// A failed or unparseable review call is a non-fixable rejection, so the
    /// controller moves to a different engine.
    pub async fn review(
        &self,
        question_text: &str,
        attempt: &RenderAttempt,
        style_hint: &str,
    ) -> ReviewVerdict {
        let start = Instant::now();
        let result = self.try_review(question_text, attempt, style_hint).await;
        metrics::histogram!("plotwise_stage_duration_seconds", "stage" => "review")
            .record(start.elapsed().as_secs_f64());

        match result {
            Ok(verdict) => {
                debug!(
                    tool = %attempt.tool_name,
                    attempt = attempt.attempt_number,
                    accepted = verdict.accepted,
                    fixable = verdict.fixable,
                    issue = ?verdict.issue,
                    reason_preview = ?self.reason_preview(&verdict),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Review finished"
                );
                verdict
            }
            Err(e) => {
                warn!(
                    tool = %attempt.tool_name,
                    attempt = attempt.attempt_number,
                    error = %e,
                    "Review call failed, treating as rejection"
                );
                ReviewVerdict::reject_hard(None, format!("review unavailable: {}", e))
            }
        }
    }

    async fn try_review(
        &self,
        question_text: &str,
        attempt: &RenderAttempt,
        style_hint: &str,
    ) -> Result<ReviewVerdict, String> {
        if attempt.raw_output.is_empty() {
            return Err("attempt has no image".to_string());
        }
        let mime = image_mime(&attempt.raw_output);
        let encoded = BASE64.encode(&attempt.raw_output);

        let request = ChatCompletionRequest::new(
            self.model.clone(),
            vec![
                ChatMessage::system(RUBRIC),
                ChatMessage::user_parts(vec![
                    ContentPart::text(format!(
                        "Question:\n{}\n\nSubject conventions: {}",
                        question_text.trim(),
                        style_hint
                    )),
                    ContentPart::image_data(mime, &encoded),
                ]),
            ],
        )
        .with_temperature(0.0)
        .with_max_tokens(600)
        .with_json_mode();

        let response = tokio::time::timeout(self.timeout, self.agent.chat_completion(request, self.timeout))
            .await
            .map_err(|_| format!("timed out after {}ms", self.timeout.as_millis()))?
            .map_err(|e| e.to_string())?;
        crate::metrics::record_token_usage("review", &response);
        let text = response
            .first_text()
            .ok_or_else(|| "empty reply".to_string())?;
        parse_verdict(&text)
    }
}

fn image_mime(bytes: &[u8]) -> &'static str {
    match image::guess_format(bytes) {
        Ok(image::ImageFormat::Jpeg) => "image/jpeg",
        Ok(image::ImageFormat::WebP) => "image/webp",
        _ => "image/png",
    }
}
