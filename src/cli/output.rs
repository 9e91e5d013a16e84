//! Output formatting helpers for CLI commands

use crate::pipeline::BatchReport;
use crate::question::{DiagramResult, DiagramStatus};
use crate::render::ToolName;
use crate::taxonomy::Classification;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};
use serde::Serialize;
use serde_json::json;

/// View model for `plotwise guidance`
#[derive(Debug, Clone, Serialize)]
pub struct GuidanceView {
    pub domain: String,
    pub diagram_type: String,
    pub agent_guidance: String,
    pub generation_style_guidance: String,
    pub reviewer_style_hint: String,
    pub engines: Vec<ToolName>,
}

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn status_label(status: DiagramStatus) -> String {
    match status {
        DiagramStatus::Attached => "attached".green().to_string(),
        DiagramStatus::SkippedNotNeeded => "not needed".cyan().to_string(),
        DiagramStatus::SkippedExhausted => "exhausted".red().to_string(),
    }
}

fn engine_list(engines: &[ToolName]) -> String {
    engines
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Format batch results as a table
pub fn format_results_table(results: &[DiagramResult]) -> String {
    let mut table = new_table(vec!["Question", "Status", "Tool", "Attempts", "Key", "Caption"]);

    for r in results {
        table.add_row(vec![
            Cell::new(r.question_id()),
            Cell::new(status_label(r.status())),
            Cell::new(r.final_tool().map(|t| t.as_str()).unwrap_or("-")),
            Cell::new(r.attempts_used()),
            Cell::new(r.storage_key().unwrap_or("-")),
            Cell::new(r.caption().unwrap_or("")),
        ]);
    }

    table.to_string()
}

/// One-line batch summary
pub fn format_summary(report: &BatchReport) -> String {
    format!(
        "{} questions: {} attached, {} not needed, {} exhausted (run {})",
        report.results.len(),
        report.count(DiagramStatus::Attached),
        report.count(DiagramStatus::SkippedNotNeeded),
        report.count(DiagramStatus::SkippedExhausted),
        report.run_id
    )
}

/// Format a batch report as JSON
pub fn format_report_json(report: &BatchReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Format a classification and its engine order as a table
pub fn format_classification_table(classification: &Classification, engines: &[ToolName]) -> String {
    let mut table = new_table(vec!["Field", "Value"]);
    table.add_row(vec![Cell::new("Domain"), Cell::new(classification.domain)]);
    table.add_row(vec![
        Cell::new("Diagram type"),
        Cell::new(classification.diagram_type),
    ]);
    table.add_row(vec![
        Cell::new("Complexity"),
        Cell::new(classification.complexity),
    ]);
    table.add_row(vec![
        Cell::new("Generative suitable"),
        Cell::new(classification.generative_suitable),
    ]);
    table.add_row(vec![Cell::new("Engines"), Cell::new(engine_list(engines))]);
    table.to_string()
}

/// Format a classification and its engine order as JSON
pub fn format_classification_json(
    classification: &Classification,
    engines: &[ToolName],
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&json!({
        "classification": classification,
        "engines": engines,
    }))
}

/// Format composer guidance as a table
pub fn format_guidance_table(view: &GuidanceView) -> String {
    let mut table = new_table(vec!["Stage", "Guidance"]);
    table.add_row(vec![Cell::new("Selection agent"), Cell::new(&view.agent_guidance)]);
    table.add_row(vec![
        Cell::new("Rendering style"),
        Cell::new(&view.generation_style_guidance),
    ]);
    table.add_row(vec![Cell::new("Reviewer"), Cell::new(&view.reviewer_style_hint)]);
    table.add_row(vec![Cell::new("Engines"), Cell::new(engine_list(&view.engines))]);
    format!("{} / {}\n{}", view.domain.bold(), view.diagram_type.bold(), table)
}

/// Format composer guidance as JSON
pub fn format_guidance_json(view: &GuidanceView) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(view)
}
