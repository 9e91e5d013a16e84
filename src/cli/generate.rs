//! Generate command implementation

use crate::api::QuestionInput;
use crate::cli::output::{format_report_json, format_results_table, format_summary};
use crate::cli::serve::{build_http_client, init_cli_tracing, load_config};
use crate::cli::GenerateArgs;
use crate::pipeline::{run_batch, DiagramPipeline};
use crate::question::{DiagramRequest, QuestionRecord};
use std::path::Path;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Read a JSON array of question records. Records without an `id` get
/// `q{n}` by position.
pub fn read_questions(path: &Path) -> Result<Vec<QuestionInput>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
    let questions: Vec<QuestionInput> = serde_json::from_str(&content)
        .map_err(|e| format!("Invalid question file {}: {}", path.display(), e))?;
    if questions.is_empty() {
        return Err(format!("No questions in {}", path.display()).into());
    }
    Ok(questions)
}

fn build_requests(inputs: &[QuestionInput], args: &GenerateArgs) -> Vec<DiagramRequest> {
    inputs
        .iter()
        .enumerate()
        .map(|(index, input)| {
            let id = input
                .id
                .clone()
                .filter(|id| !id.trim().is_empty())
                .unwrap_or_else(|| format!("q{}", index + 1));
            DiagramRequest::from_record(id, &input.record, args.subject.clone(), args.engine)
        })
        .collect()
}

fn single_question(text: &str) -> QuestionInput {
    QuestionInput {
        id: None,
        record: QuestionRecord {
            question_text: text.to_string(),
            hint_diagram_needed: true,
            hint_caption: None,
            hint_page_number: None,
        },
    }
}

/// Handle `plotwise generate`
pub async fn run_generate(args: GenerateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let inputs = match (&args.question, &args.input) {
        (Some(text), _) => vec![single_question(text)],
        (None, Some(path)) => read_questions(path)?,
        (None, None) => return Err("Either --question or --input is required".into()),
    };

    init_cli_tracing(&args.log_level)?;
    let config = load_config(&args.config)?;
    config.validate()?;

    let client = Arc::new(build_http_client(&config)?);
    let pipeline = Arc::new(DiagramPipeline::from_config(&config, client)?);
    let requests = build_requests(&inputs, &args);

    // Ctrl-C stops every question before its next attempt.
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, finishing current stages");
            on_interrupt.cancel();
        }
    });

    let report = run_batch(pipeline, requests, config.pipeline.concurrency, cancel).await;

    if args.json {
        println!("{}", format_report_json(&report)?);
    } else {
        println!("{}", format_results_table(&report.results));
        println!("{}", format_summary(&report));
    }
    Ok(())
}
