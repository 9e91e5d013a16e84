//! Integration tests for the HTTP API.
//!
//! Model endpoints are served by a wiremock server speaking the OpenAI chat
//! format; the schematic compiler is a shell stand-in that decodes base64.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use common::png_fixture;
use plotwise::api::{create_router, AppState};
use plotwise::config::{EndpointConfig, EndpointType, MarkupCompilerConfig, PlotwiseConfig};
use plotwise::pipeline::DiagramPipeline;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use tower::Service;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn text_completion(text: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 0,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": text},
            "finish_reason": "stop"
        }]
    })
}

fn tool_completion(name: &str, arguments: Value) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 0,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_0",
                    "type": "function",
                    "function": {"name": name, "arguments": arguments.to_string()}
                }]
            },
            "finish_reason": "tool_calls"
        }]
    })
}

/// Mount one chat reply per stage, told apart by text unique to each prompt.
async fn mount_stage(server: &MockServer, marker: &str, priority: u8, body: Value) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains(marker))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .with_priority(priority)
        .mount(server)
        .await;
}

async fn mount_circuit_models(server: &MockServer, selection: Value) {
    mount_stage(
        server,
        "answer_leakage",
        1,
        text_completion(r#"{"accepted": true, "reason": "clear and complete"}"#),
    )
    .await;
    mount_stage(
        server,
        "TestMarkup",
        2,
        text_completion(&format!("```\n{}\n```", BASE64.encode(png_fixture(60, 40)))),
    )
    .await;
    mount_stage(server, "skip_diagram", 3, selection).await;
    mount_stage(
        server,
        "generative_suitable",
        4,
        text_completion(
            r#"{"domain": "electrical", "diagram_type": "circuit_schematic", "complexity": "simple", "generative_suitable": false}"#,
        ),
    )
    .await;
}

fn test_config(model_url: &str, store_root: &TempDir) -> PlotwiseConfig {
    let mut config = PlotwiseConfig::default();
    config.endpoints = vec![EndpointConfig {
        name: "local".to_string(),
        url: model_url.to_string(),
        endpoint_type: EndpointType::Generic,
        api_key_env: None,
        vision: true,
    }];
    config.models.classifier.endpoint = "local".to_string();
    config.models.selector.endpoint = "local".to_string();
    config.models.codegen.endpoint = "local".to_string();
    config.models.reviewer.endpoint = "local".to_string();
    config.models.image.endpoint = "local".to_string();
    config.sandbox.schematic = MarkupCompilerConfig {
        dialect: "TestMarkup".to_string(),
        program: "sh".to_string(),
        args: vec![
            "-c".to_string(),
            "base64 -d \"$0\" > \"$1\"".to_string(),
            "{input}".to_string(),
            "{output}".to_string(),
        ],
        source_file: "diagram.b64".to_string(),
    };
    config.storage.root = store_root.path().to_path_buf();
    config
}

fn create_test_state(model_url: &str, store_root: &TempDir) -> Arc<AppState> {
    let config = test_config(model_url, store_root);
    let client = Arc::new(reqwest::Client::new());
    let pipeline = Arc::new(DiagramPipeline::from_config(&config, client).unwrap());
    Arc::new(AppState::new(Arc::new(config), pipeline))
}

async fn create_test_app(model_url: &str, store_root: &TempDir) -> axum::Router {
    create_router(create_test_state(model_url, store_root))
}

fn post_diagrams(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/v1/diagrams")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_reports_configuration() {
    let store = TempDir::new().unwrap();
    let mut app = create_test_app("http://127.0.0.1:9", &store).await;

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "filesystem");
    assert_eq!(body["max_attempts"], 3);
    // The generic endpoint serving `[models.image]` cannot generate images.
    assert_eq!(body["engines"], json!(["draw_schematic", "plot_with_code"]));
}

#[tokio::test]
async fn test_reviewer_without_vision_fails_startup() {
    let store = TempDir::new().unwrap();
    let mut config = test_config("http://127.0.0.1:9", &store);
    config.endpoints[0].vision = false;

    let client = Arc::new(reqwest::Client::new());
    let err = DiagramPipeline::from_config(&config, client)
        .err()
        .expect("reviewer endpoint without vision must be rejected");
    assert!(err.to_string().contains("vision"));
}

#[tokio::test]
async fn test_batch_attaches_compiled_schematic() {
    let server = MockServer::start().await;
    mount_circuit_models(
        &server,
        tool_completion(
            "draw_schematic",
            json!({"description": "Series circuit with a 12 V source, R1 = 10 Ω and R2 = 20 Ω. Current unknown."}),
        ),
    )
    .await;

    let store = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &store).await;

    let body = json!({
        "subject_hint": "electrical engineering",
        "questions": [{
            "id": "circuit-1",
            "question_text": "A 12 V battery drives R1 = 10 Ω and R2 = 20 Ω in series. Find the current.",
            "hint_diagram_needed": true,
            "hint_page_number": 3
        }]
    });
    let response = app.call(post_diagrams(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;

    let question = &body["questions"][0];
    assert_eq!(question["hint_page_number"], 3);
    assert_eq!(question["hasDiagram"], true);
    assert_eq!(
        question["diagram"]["caption"],
        "Series circuit with a 12 V source, R1 = 10 Ω and R2 = 20 Ω."
    );

    let result = &body["results"][0];
    assert_eq!(result["status"], "attached");
    assert_eq!(result["attempts_used"], 1);
    assert_eq!(result["final_tool"], "draw_schematic");

    let key = question["diagram"]["storage_key"].as_str().unwrap();
    assert!(key.starts_with("diagrams/circuit-1/"));
    let stored = std::fs::read(store.path().join(key)).unwrap();
    assert!(image::load_from_memory(&stored).is_ok());
}

#[tokio::test]
async fn test_batch_marks_unneeded_figure() {
    let server = MockServer::start().await;
    mount_circuit_models(
        &server,
        tool_completion("skip_diagram", json!({"reason": "answerable from the text"})),
    )
    .await;

    let store = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &store).await;

    let body = json!({
        "questions": [{"question_text": "State Ohm's law."}]
    });
    let response = app.call(post_diagrams(&body.to_string())).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["questions"][0]["hasDiagram"], false);
    assert!(body["questions"][0]["diagram"].is_null());
    assert_eq!(body["results"][0]["question_id"], "q1");
    assert_eq!(body["results"][0]["status"], "skipped_not_needed");
}

#[tokio::test]
async fn test_empty_batch_is_bad_request() {
    let store = TempDir::new().unwrap();
    let mut app = create_test_app("http://127.0.0.1:9", &store).await;

    let response = app.call(post_diagrams(r#"{"questions": []}"#)).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["type"], "invalid_request_error");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("questions"));
}

#[tokio::test]
async fn test_malformed_body_is_bad_request() {
    let store = TempDir::new().unwrap();
    let mut app = create_test_app("http://127.0.0.1:9", &store).await;

    let response = app.call(post_diagrams("{not json")).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_request_error");
}

#[tokio::test]
async fn test_blank_question_is_bad_request() {
    let store = TempDir::new().unwrap();
    let mut app = create_test_app("http://127.0.0.1:9", &store).await;

    let response = app
        .call(post_diagrams(r#"{"questions": [{"question_text": "   "}]}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_shutdown_rejects_new_batches() {
    let store = TempDir::new().unwrap();
    let config = test_config("http://127.0.0.1:9", &store);
    let client = Arc::new(reqwest::Client::new());
    let pipeline = Arc::new(DiagramPipeline::from_config(&config, client).unwrap());
    let shutdown = CancellationToken::new();
    let state =
        Arc::new(AppState::new(Arc::new(config), pipeline).with_shutdown(shutdown.clone()));
    let mut app = create_router(state);

    shutdown.cancel();
    let response = app
        .call(post_diagrams(r#"{"questions": [{"question_text": "Draw a truss."}]}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let body = json_body(app.call(request).await.unwrap()).await;
    assert_eq!(body["status"], "shutting_down");
}

#[tokio::test]
async fn test_metrics_endpoint_serves_text() {
    let store = TempDir::new().unwrap();
    let mut app = create_test_app("http://127.0.0.1:9", &store).await;

    let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let store = TempDir::new().unwrap();
    let mut app = create_test_app("http://127.0.0.1:9", &store).await;

    let request = Request::builder()
        .uri("/v1/unknown")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
