//! End-to-end pipeline scenarios with scripted models and stub engines.

mod common;

use common::*;
use plotwise::pipeline::run_batch;
use plotwise::question::{DiagramRequest, DiagramStatus, EnginePreference, QuestionHints};
use plotwise::render::ToolName;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SERIES_CIRCUIT: &str = "A 12 V battery drives R1 = 10 Ω and R2 = 20 Ω in series. Find the current I.";
const RECTANGLE: &str = "A rectangle has sides 3 cm and 4 cm. Find its area.";

fn circuit_fixture(reviewer: QueueAgent) -> Fixture {
    Fixture::new(
        QueueAgent::new().text(&classification_reply("electrical", "circuit_schematic", false)),
        QueueAgent::new().tool(
            "draw_schematic",
            json!({"description": "Series circuit: 12 V source, R1 = 10 Ω, R2 = 20 Ω. Current I marked unknown."}),
        ),
        reviewer,
    )
}

#[tokio::test]
async fn test_series_circuit_accepted_first_try() {
    let fixture = circuit_fixture(QueueAgent::new().text(&accept_reply()))
        .with_schematic(StubRenderer::new(ToolName::DrawSchematic).image("graph { R1 -- R2 }"));
    let pipeline = fixture.pipeline();

    let request = DiagramRequest::new("q1", SERIES_CIRCUIT);
    let result = pipeline.process(&request, &CancellationToken::new()).await;

    assert_eq!(result.status(), DiagramStatus::Attached);
    assert_eq!(result.attempts_used(), 1);
    assert_eq!(result.final_tool(), Some(ToolName::DrawSchematic));
    assert_eq!(
        result.caption(),
        Some("Series circuit: 12 V source, R1 = 10 Ω, R2 = 20 Ω.")
    );

    let key = result.storage_key().unwrap();
    assert!(key.starts_with("diagrams/q1/"));
    assert!(key.ends_with(".png"));
    let stored = fixture.store.get(key).unwrap();
    assert!(image::load_from_memory(&stored).is_ok());

    assert_eq!(fixture.reviewer.call_count(), 1);
    assert_eq!(fixture.code.call_count(), 0);

    let attachment = result.attachment();
    assert!(attachment.has_diagram);
    assert_eq!(attachment.diagram.unwrap().storage_key.as_deref(), Some(key));
}

#[tokio::test]
async fn test_caption_hint_wins_over_description() {
    let fixture = circuit_fixture(QueueAgent::new().text(&accept_reply()))
        .with_schematic(StubRenderer::new(ToolName::DrawSchematic).image("graph {}"));
    let pipeline = fixture.pipeline();

    let request = DiagramRequest::new("q1", SERIES_CIRCUIT).with_hints(QuestionHints {
        diagram_needed: true,
        caption: Some("Two resistors in series".to_string()),
        page_number: None,
    });
    let result = pipeline.process(&request, &CancellationToken::new()).await;

    assert_eq!(result.caption(), Some("Two resistors in series"));
}

#[tokio::test]
async fn test_leakage_switches_to_other_engine() {
    let fixture = Fixture::new(
        QueueAgent::new().text(&classification_reply("mathematics", "coordinate_geometry", false)),
        QueueAgent::new().tool(
            "plot_with_code",
            json!({"description": "Rectangle with sides labeled 3 cm and 4 cm."}),
        ),
        QueueAgent::new()
            .text(&leakage_reply("figure prints Area = 12 cm²"))
            .text(&accept_reply()),
    )
    .with_code(StubRenderer::new(ToolName::PlotWithCode).image("plt.text(1, 1, 'Area = 12')"))
    .with_schematic(StubRenderer::new(ToolName::DrawSchematic).image("graph { a -- b }"));
    let pipeline = fixture.pipeline();

    let request = DiagramRequest::new("q2", RECTANGLE);
    let result = pipeline.process(&request, &CancellationToken::new()).await;

    assert_eq!(result.status(), DiagramStatus::Attached);
    assert_eq!(result.attempts_used(), 2);
    assert_eq!(result.final_tool(), Some(ToolName::DrawSchematic));

    // The fallback starts over from the original brief.
    let seen = fixture.schematic.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].description, "Rectangle with sides labeled 3 cm and 4 cm.");
    assert!(seen[0].previous_artifact.is_none());
}

#[tokio::test]
async fn test_fixable_rejection_retries_same_engine_with_correction() {
    let fixture = circuit_fixture(
        QueueAgent::new()
            .text(&fixable_reply(
                "missing_labels",
                "R2 has no value",
                "Series circuit with R1 = 10 Ω and R2 = 20 Ω both labeled.",
            ))
            .text(&accept_reply()),
    )
    .with_schematic(
        StubRenderer::new(ToolName::DrawSchematic)
            .image("graph { R1 -- R2 }")
            .image("graph { R1 -- R2 [label=\"20 Ω\"] }"),
    );
    let pipeline = fixture.pipeline();

    let result = pipeline
        .process(&DiagramRequest::new("q3", SERIES_CIRCUIT), &CancellationToken::new())
        .await;

    assert_eq!(result.status(), DiagramStatus::Attached);
    assert_eq!(result.attempts_used(), 2);
    assert_eq!(result.final_tool(), Some(ToolName::DrawSchematic));

    let seen = fixture.schematic.seen();
    assert_eq!(seen.len(), 2);
    assert_eq!(
        seen[1].description,
        "Series circuit with R1 = 10 Ω and R2 = 20 Ω both labeled."
    );
    assert_eq!(seen[1].previous_artifact.as_deref(), Some("graph { R1 -- R2 }"));
}

#[tokio::test]
async fn test_engine_errors_exhaust_budget() {
    let fixture = Fixture::new(
        QueueAgent::new().text(&classification_reply("mathematics", "function_plot", false)),
        QueueAgent::new().tool("plot_with_code", json!({"description": "Plot y = x^2"})),
        QueueAgent::new(),
    )
    .with_code(
        StubRenderer::new(ToolName::PlotWithCode)
            .failure("import matplotlib", "SyntaxError")
            .failure("import matplotlib", "SyntaxError"),
    )
    .with_schematic(StubRenderer::new(ToolName::DrawSchematic).failure("digraph {", "syntax error"));
    let pipeline = fixture.pipeline();

    let result = pipeline
        .process(
            &DiagramRequest::new("q4", "Sketch y = x^2 for -2 ≤ x ≤ 2."),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.status(), DiagramStatus::SkippedExhausted);
    assert_eq!(result.attempts_used(), 3);
    assert!(result.storage_key().is_none());
    assert!(!result.attachment().has_diagram);
    assert_eq!(fixture.total_renders(), 3);
    assert_eq!(fixture.reviewer.call_count(), 0);
    assert!(fixture.store.is_empty());
}

#[tokio::test]
async fn test_rejections_never_exceed_budget() {
    let fixture = circuit_fixture(
        QueueAgent::new().always_text(
            r#"{"accepted": false, "issue": "implausible", "reason": "wrong symbol", "fixable": false}"#,
        ),
    )
    .with_schematic(StubRenderer::new(ToolName::DrawSchematic).always_image("graph {}"))
    .with_code(StubRenderer::new(ToolName::PlotWithCode).always_image("plt.plot()"));
    let pipeline = fixture.pipeline();

    let result = pipeline
        .process(&DiagramRequest::new("q5", SERIES_CIRCUIT), &CancellationToken::new())
        .await;

    assert_eq!(result.status(), DiagramStatus::SkippedExhausted);
    assert_eq!(result.attempts_used(), 3);
    assert_eq!(fixture.total_renders(), 3);
    assert_eq!(fixture.generative.call_count(), 0);
}

#[tokio::test]
async fn test_skip_tool_means_not_needed() {
    let fixture = Fixture::new(
        QueueAgent::new().text(&classification_reply("computer_science", "generic", false)),
        QueueAgent::new().tool("skip_diagram", json!({"reason": "purely textual"})),
        QueueAgent::new(),
    );
    let pipeline = fixture.pipeline();

    let result = pipeline
        .process(
            &DiagramRequest::new("q6", "What is the time complexity of binary search?"),
            &CancellationToken::new(),
        )
        .await;

    assert_eq!(result.status(), DiagramStatus::SkippedNotNeeded);
    assert_eq!(result.attempts_used(), 0);
    assert!(result.final_tool().is_none());
    assert_eq!(fixture.total_renders(), 0);
    assert!(!result.attachment().has_diagram);
}

#[tokio::test]
async fn test_generative_choice_overridden_when_unsuitable() {
    let fixture = Fixture::new(
        QueueAgent::new().text(&classification_reply("electrical", "circuit_schematic", false)),
        QueueAgent::new().tool("generate_image", json!({"description": "A pretty circuit"})),
        QueueAgent::new().text(&accept_reply()),
    )
    .with_schematic(StubRenderer::new(ToolName::DrawSchematic).image("graph {}"))
    .with_generative(StubRenderer::new(ToolName::GenerateImage).always_image("a prompt"));
    let pipeline = fixture.pipeline();

    let request = DiagramRequest::new("q7", SERIES_CIRCUIT)
        .with_engine_preference(EnginePreference::PreferGenerative);
    let result = pipeline.process(&request, &CancellationToken::new()).await;

    assert_eq!(result.status(), DiagramStatus::Attached);
    assert_eq!(result.final_tool(), Some(ToolName::DrawSchematic));
    assert_eq!(fixture.generative.call_count(), 0);
}

#[tokio::test]
async fn test_publish_failure_leaves_question_without_diagram() {
    let fixture = circuit_fixture(QueueAgent::new().text(&accept_reply()))
        .with_schematic(StubRenderer::new(ToolName::DrawSchematic).image("graph {}"))
        .with_store(MemoryStore::failing());
    let pipeline = fixture.pipeline();

    let result = pipeline
        .process(&DiagramRequest::new("q8", SERIES_CIRCUIT), &CancellationToken::new())
        .await;

    assert_eq!(result.status(), DiagramStatus::SkippedExhausted);
    assert_eq!(result.attempts_used(), 1);
    assert_eq!(result.final_tool(), Some(ToolName::DrawSchematic));
    assert!(result.storage_key().is_none());
    assert!(!result.attachment().has_diagram);
}

#[tokio::test]
async fn test_cancelled_before_start_does_nothing() {
    let fixture = circuit_fixture(QueueAgent::new());
    let pipeline = fixture.pipeline();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = pipeline
        .process(&DiagramRequest::new("q9", SERIES_CIRCUIT), &cancel)
        .await;

    assert_eq!(result.status(), DiagramStatus::SkippedExhausted);
    assert_eq!(result.attempts_used(), 0);
    assert_eq!(fixture.classifier.call_count(), 0);
    assert_eq!(fixture.total_renders(), 0);
}

#[tokio::test]
async fn test_cancel_mid_question_stops_before_next_attempt() {
    let cancel = CancellationToken::new();
    let fixture = circuit_fixture(QueueAgent::new()).with_schematic(
        StubRenderer::new(ToolName::DrawSchematic)
            .failure("graph {", "syntax error")
            .cancelling(cancel.clone()),
    );
    let pipeline = fixture.pipeline();

    let result = pipeline
        .process(&DiagramRequest::new("q10", SERIES_CIRCUIT), &cancel)
        .await;

    assert_eq!(result.status(), DiagramStatus::SkippedExhausted);
    assert_eq!(result.attempts_used(), 1);
    assert!(result.final_tool().is_none());
    assert_eq!(fixture.total_renders(), 1);
}

#[tokio::test]
async fn test_batch_preserves_order_and_isolates_panics() {
    let fixture = Fixture::new(
        QueueAgent::new().always_text(&classification_reply("mathematics", "function_plot", false)),
        QueueAgent::new().always_tool("plot_with_code", json!({})),
        QueueAgent::new().always_text(&accept_reply()),
    )
    .with_code(
        StubRenderer::new(ToolName::PlotWithCode)
            .always_image("plt.plot(x, y)")
            .panicking_on("CRASH"),
    );
    let pipeline = Arc::new(fixture.pipeline());

    let requests = vec![
        DiagramRequest::new("a", "Plot y = sin(x) over one period."),
        DiagramRequest::new("b", "Plot y = e^x. CRASH"),
        DiagramRequest::new("c", "Plot y = ln(x) for x > 0."),
        DiagramRequest::new("d", "Plot y = |x|."),
    ];
    let report = run_batch(pipeline, requests, 2, CancellationToken::new()).await;

    let ids: Vec<&str> = report.results.iter().map(|r| r.question_id()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
    assert_eq!(report.count(DiagramStatus::Attached), 3);
    assert_eq!(report.results[1].status(), DiagramStatus::SkippedExhausted);
    assert_eq!(report.results[1].attempts_used(), 0);
    assert!(!report.run_id.is_empty());

    // Each accepted question gets its own object.
    assert_eq!(fixture.store.len(), 3);
    for result in report.results.iter().filter(|r| r.has_diagram()) {
        let key = result.storage_key().unwrap();
        assert!(key.starts_with(&format!("diagrams/{}/", result.question_id())));
    }
}

#[tokio::test]
async fn test_batch_cancelled_up_front() {
    let fixture = circuit_fixture(QueueAgent::new());
    let pipeline = Arc::new(fixture.pipeline());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let requests = vec![
        DiagramRequest::new("x", SERIES_CIRCUIT),
        DiagramRequest::new("y", RECTANGLE),
    ];
    let report = run_batch(pipeline, requests, 4, cancel).await;

    assert_eq!(report.results.len(), 2);
    assert_eq!(report.count(DiagramStatus::SkippedExhausted), 2);
    assert_eq!(fixture.total_renders(), 0);
}

#[tokio::test]
async fn test_dropped_batch_lets_running_render_finish() {
    let fixture = circuit_fixture(QueueAgent::new().always_text(&accept_reply()))
        .with_schematic(
            StubRenderer::new(ToolName::DrawSchematic)
                .always_image("graph { R1 -- R2 }")
                .delayed(Duration::from_millis(300)),
        );
    let pipeline = Arc::new(fixture.pipeline());
    let cancel = CancellationToken::new();

    let requests = vec![
        DiagramRequest::new("first", SERIES_CIRCUIT),
        DiagramRequest::new("second", SERIES_CIRCUIT),
    ];
    let batch = run_batch(pipeline, requests, 1, cancel.clone());
    assert!(tokio::time::timeout(Duration::from_millis(100), batch)
        .await
        .is_err());

    tokio::time::sleep(Duration::from_millis(600)).await;

    // The render under way when the batch was dropped completes and is
    // published; the queued question never starts an attempt.
    assert_eq!(fixture.schematic.call_count(), 1);
    assert_eq!(fixture.schematic.finished_count(), 1);
    assert_eq!(fixture.reviewer.call_count(), 1);
    assert_eq!(fixture.store.len(), 1);
    assert!(fixture.store.get_prefixed("diagrams/first/").is_some());
    assert!(!cancel.is_cancelled());
}
