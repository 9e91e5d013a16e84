//! Inbound question records, per-question requests and terminal results.

use crate::render::ToolName;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Caller preference between code-based and generative rendering.
///
/// A preference never overrides a classification that rules out the
/// generative engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnginePreference {
    #[default]
    Auto,
    PreferCode,
    PreferGenerative,
}

impl FromStr for EnginePreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(EnginePreference::Auto),
            "prefer_code" | "code" => Ok(EnginePreference::PreferCode),
            "prefer_generative" | "generative" => Ok(EnginePreference::PreferGenerative),
            _ => Err(format!("Invalid engine preference: {}", s)),
        }
    }
}

/// Question record as produced by the upstream question generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub question_text: String,
    #[serde(default)]
    pub hint_diagram_needed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_caption: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint_page_number: Option<u32>,
}

/// Advisory hints carried from the question record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionHints {
    pub diagram_needed: bool,
    pub caption: Option<String>,
    pub page_number: Option<u32>,
}

/// One question's input to the pipeline. Built once per generation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramRequest {
    pub question_id: String,
    pub question_text: String,
    pub subject_hint: Option<String>,
    pub engine_preference: EnginePreference,
    pub hints: QuestionHints,
}

impl DiagramRequest {
    pub fn new(question_id: impl Into<String>, question_text: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            question_text: question_text.into(),
            subject_hint: None,
            engine_preference: EnginePreference::Auto,
            hints: QuestionHints::default(),
        }
    }

    /// Build a request from an upstream record plus assignment-level settings.
    pub fn from_record(
        question_id: impl Into<String>,
        record: &QuestionRecord,
        subject_hint: Option<String>,
        engine_preference: EnginePreference,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            question_text: record.question_text.clone(),
            subject_hint,
            engine_preference,
            hints: QuestionHints {
                diagram_needed: record.hint_diagram_needed,
                caption: record.hint_caption.clone(),
                page_number: record.hint_page_number,
            },
        }
    }

    pub fn with_subject_hint(mut self, subject: impl Into<String>) -> Self {
        self.subject_hint = Some(subject.into());
        self
    }

    pub fn with_engine_preference(mut self, preference: EnginePreference) -> Self {
        self.engine_preference = preference;
        self
    }

    pub fn with_hints(mut self, hints: QuestionHints) -> Self {
        self.hints = hints;
        self
    }
}

/// Terminal status of one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagramStatus {
    Attached,
    SkippedNotNeeded,
    SkippedExhausted,
}

impl DiagramStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagramStatus::Attached => "attached",
            DiagramStatus::SkippedNotNeeded => "skipped_not_needed",
            DiagramStatus::SkippedExhausted => "skipped_exhausted",
        }
    }
}

impl fmt::Display for DiagramStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal artifact for one question. Constructed once when the pipeline
/// finishes and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramResult {
    question_id: String,
    status: DiagramStatus,
    storage_key: Option<String>,
    attempts_used: u32,
    final_tool: Option<ToolName>,
    caption: Option<String>,
}

impl DiagramResult {
    pub fn attached(
        question_id: impl Into<String>,
        storage_key: String,
        attempts_used: u32,
        final_tool: ToolName,
        caption: String,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            status: DiagramStatus::Attached,
            storage_key: Some(storage_key),
            attempts_used,
            final_tool: Some(final_tool),
            caption: Some(caption),
        }
    }

    pub fn not_needed(question_id: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            status: DiagramStatus::SkippedNotNeeded,
            storage_key: None,
            attempts_used: 0,
            final_tool: None,
            caption: None,
        }
    }

    /// `final_tool` is set when an image was accepted but could not be published.
    pub fn exhausted(
        question_id: impl Into<String>,
        attempts_used: u32,
        final_tool: Option<ToolName>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            status: DiagramStatus::SkippedExhausted,
            storage_key: None,
            attempts_used,
            final_tool,
            caption: None,
        }
    }

    pub fn question_id(&self) -> &str {
        &self.question_id
    }

    pub fn status(&self) -> DiagramStatus {
        self.status
    }

    pub fn storage_key(&self) -> Option<&str> {
        self.storage_key.as_deref()
    }

    pub fn attempts_used(&self) -> u32 {
        self.attempts_used
    }

    pub fn final_tool(&self) -> Option<ToolName> {
        self.final_tool
    }

    pub fn caption(&self) -> Option<&str> {
        self.caption.as_deref()
    }

    pub fn has_diagram(&self) -> bool {
        self.status == DiagramStatus::Attached
    }

    /// Student-facing view. "Not needed" and "exhausted" look the same here.
    pub fn attachment(&self) -> DiagramAttachment {
        let diagram = match (&self.storage_key, self.status) {
            (Some(key), DiagramStatus::Attached) => Some(DiagramRef {
                storage_key: Some(key.clone()),
                caption: self.caption.clone().unwrap_or_default(),
            }),
            _ => None,
        };
        DiagramAttachment {
            has_diagram: diagram.is_some(),
            diagram,
        }
    }
}

/// Fields merged back into the question record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagramAttachment {
    pub has_diagram: bool,
    pub diagram: Option<DiagramRef>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagramRef {
    pub storage_key: Option<String>,
    pub caption: String,
}

/// A question record with its diagram fields merged in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionWithDiagram {
    #[serde(flatten)]
    pub record: QuestionRecord,
    #[serde(flatten)]
    pub attachment: DiagramAttachment,
}

impl QuestionWithDiagram {
    pub fn merge(record: QuestionRecord, result: &DiagramResult) -> Self {
        Self {
            record,
            attachment: result.attachment(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_defaults_hints() {
        let record: QuestionRecord =
            serde_json::from_value(json!({"question_text": "Find R_total"})).unwrap();
        assert!(!record.hint_diagram_needed);
        assert!(record.hint_caption.is_none());
        assert!(record.hint_page_number.is_none());
    }

    #[test]
    fn request_from_record_copies_hints() {
        let record = QuestionRecord {
            question_text: "A block rests on a 30° incline".to_string(),
            hint_diagram_needed: true,
            hint_caption: Some("Block on incline".to_string()),
            hint_page_number: Some(2),
        };
        let req = DiagramRequest::from_record(
            "q1",
            &record,
            Some("physics".to_string()),
            EnginePreference::PreferCode,
        );
        assert_eq!(req.question_id, "q1");
        assert!(req.hints.diagram_needed);
        assert_eq!(req.hints.caption.as_deref(), Some("Block on incline"));
        assert_eq!(req.engine_preference, EnginePreference::PreferCode);
    }

    #[test]
    fn merged_record_uses_camel_case_fields() {
        let record = QuestionRecord {
            question_text: "Q".to_string(),
            hint_diagram_needed: true,
            hint_caption: None,
            hint_page_number: None,
        };
        let result = DiagramResult::attached(
            "q1",
            "diagrams/q1/abc.png".to_string(),
            1,
            ToolName::DrawSchematic,
            "Series circuit".to_string(),
        );
        let merged = serde_json::to_value(QuestionWithDiagram::merge(record, &result)).unwrap();
        assert_eq!(merged["hasDiagram"], json!(true));
        assert_eq!(merged["diagram"]["storage_key"], json!("diagrams/q1/abc.png"));
        assert_eq!(merged["diagram"]["caption"], json!("Series circuit"));
        assert_eq!(merged["question_text"], json!("Q"));
    }

    #[test]
    fn skipped_results_present_identically() {
        let not_needed = DiagramResult::not_needed("q1").attachment();
        let exhausted = DiagramResult::exhausted("q1", 3, None).attachment();
        assert_eq!(not_needed, exhausted);
        assert!(!not_needed.has_diagram);
        assert!(not_needed.diagram.is_none());
    }

    #[test]
    fn publish_failure_keeps_tool_but_no_key() {
        let r = DiagramResult::exhausted("q1", 2, Some(ToolName::PlotWithCode));
        assert_eq!(r.status(), DiagramStatus::SkippedExhausted);
        assert_eq!(r.final_tool(), Some(ToolName::PlotWithCode));
        assert!(r.storage_key().is_none());
        assert!(!r.has_diagram());
    }

    #[test]
    fn engine_preference_parses() {
        assert_eq!("prefer-code".parse::<EnginePreference>().unwrap(), EnginePreference::PreferCode);
        assert_eq!("AUTO".parse::<EnginePreference>().unwrap(), EnginePreference::Auto);
        assert!("fast".parse::<EnginePreference>().is_err());
    }
}
