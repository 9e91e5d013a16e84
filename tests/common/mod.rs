//! Shared test utilities for Plotwise integration tests.
//!
//! Provides scripted model agents, stub renderers, an in-memory object store
//! and pipeline builders so scenarios can be written without network access.

#![allow(dead_code)]

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbaImage};
use plotwise::agent::{
    AgentCapabilities, AgentError, AgentProfile, ChatCompletionRequest, ChatCompletionResponse,
    ModelAgent,
};
use plotwise::classifier::DomainClassifier;
use plotwise::pipeline::DiagramPipeline;
use plotwise::render::{RenderBrief, RenderEngines, RenderOutput, Renderer, ToolName};
use plotwise::review::Reviewer;
use plotwise::selection::ToolSelector;
use plotwise::storage::{ObjectStore, StorageError};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Image Fixtures
// =============================================================================

/// Encode a solid `width` x `height` PNG.
pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let image = RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]));
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

// =============================================================================
// Model Replies
// =============================================================================

pub fn classification_reply(domain: &str, diagram_type: &str, generative_suitable: bool) -> String {
    serde_json::json!({
        "domain": domain,
        "diagram_type": diagram_type,
        "complexity": "simple",
        "generative_suitable": generative_suitable
    })
    .to_string()
}

pub fn accept_reply() -> String {
    r#"{"accepted": true, "issue": null, "reason": "ok", "fixable": false, "corrected_description": null}"#
        .to_string()
}

pub fn leakage_reply(reason: &str) -> String {
    serde_json::json!({
        "accepted": false,
        "issue": "answer_leakage",
        "reason": reason,
        "fixable": true,
        "corrected_description": "same figure without the result"
    })
    .to_string()
}

pub fn fixable_reply(issue: &str, reason: &str, corrected: &str) -> String {
    serde_json::json!({
        "accepted": false,
        "issue": issue,
        "reason": reason,
        "fixable": true,
        "corrected_description": corrected
    })
    .to_string()
}

// =============================================================================
// Scripted Agent
// =============================================================================

/// Chat agent that replays queued replies in order.
///
/// Once the queue is empty it keeps answering with the `always` reply if one
/// was set, otherwise with a network error.
pub struct QueueAgent {
    replies: Mutex<VecDeque<Result<ChatCompletionResponse, AgentError>>>,
    always: Option<ChatCompletionResponse>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl QueueAgent {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            always: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(self, text: &str) -> Self {
        self.push(Ok(ChatCompletionResponse::from_text("queued", text)))
    }

    pub fn tool(self, name: &str, arguments: Value) -> Self {
        self.push(Ok(ChatCompletionResponse::from_tool_call(
            "queued", name, arguments,
        )))
    }

    pub fn error(self, error: AgentError) -> Self {
        self.push(Err(error))
    }

    pub fn always_text(mut self, text: &str) -> Self {
        self.always = Some(ChatCompletionResponse::from_text("queued", text));
        self
    }

    pub fn always_tool(mut self, name: &str, arguments: Value) -> Self {
        self.always = Some(ChatCompletionResponse::from_tool_call(
            "queued", name, arguments,
        ));
        self
    }

    fn push(self, reply: Result<ChatCompletionResponse, AgentError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for QueueAgent {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelAgent for QueueAgent {
    fn id(&self) -> &str {
        "queued"
    }

    fn name(&self) -> &str {
        "Queued"
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "queued".to_string(),
            capabilities: AgentCapabilities {
                tool_calling: true,
                vision: true,
                image_generation: false,
            },
        }
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
        _timeout: Duration,
    ) -> Result<ChatCompletionResponse, AgentError> {
        self.requests.lock().unwrap().push(request);
        let next = self.replies.lock().unwrap().pop_front();
        match (next, &self.always) {
            (Some(reply), _) => reply,
            (None, Some(always)) => Ok(always.clone()),
            (None, None) => Err(AgentError::Network("no reply queued".to_string())),
        }
    }
}

// =============================================================================
// Stub Renderers
// =============================================================================

/// What a stub renderer was asked to draw.
#[derive(Debug, Clone)]
pub struct SeenBrief {
    pub description: String,
    pub previous_artifact: Option<String>,
}

/// Renderer that replays queued outputs and records every brief.
pub struct StubRenderer {
    tool: ToolName,
    outputs: Mutex<VecDeque<RenderOutput>>,
    always: Option<RenderOutput>,
    seen: Mutex<Vec<SeenBrief>>,
    cancel_on_render: Option<CancellationToken>,
    panic_on: Option<String>,
    delay: Option<Duration>,
    finished: AtomicUsize,
}

impl StubRenderer {
    pub fn new(tool: ToolName) -> Self {
        Self {
            tool,
            outputs: Mutex::new(VecDeque::new()),
            always: None,
            seen: Mutex::new(Vec::new()),
            cancel_on_render: None,
            panic_on: None,
            delay: None,
            finished: AtomicUsize::new(0),
        }
    }

    /// Queue a successful render of a small PNG with `artifact` as its source.
    pub fn image(self, artifact: &str) -> Self {
        self.output(RenderOutput::success(png_fixture(40, 30), artifact))
    }

    pub fn failure(self, artifact: &str, error: &str) -> Self {
        self.output(RenderOutput::failure(artifact, error))
    }

    pub fn output(self, output: RenderOutput) -> Self {
        self.outputs.lock().unwrap().push_back(output);
        self
    }

    pub fn always_image(mut self, artifact: &str) -> Self {
        self.always = Some(RenderOutput::success(png_fixture(40, 30), artifact));
        self
    }

    /// Cancel `token` while rendering, as an interrupt arriving mid-attempt would.
    pub fn cancelling(mut self, token: CancellationToken) -> Self {
        self.cancel_on_render = Some(token);
        self
    }

    /// Panic when the brief mentions `needle`.
    pub fn panicking_on(mut self, needle: &str) -> Self {
        self.panic_on = Some(needle.to_string());
        self
    }

    /// Take `delay` to render, like a slow compiler would.
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Renders that ran to completion.
    pub fn finished_count(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenBrief> {
        self.seen.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    fn tool(&self) -> ToolName {
        self.tool
    }

    async fn render(&self, brief: &RenderBrief) -> RenderOutput {
        self.seen.lock().unwrap().push(SeenBrief {
            description: brief.description_or_spec.clone(),
            previous_artifact: brief.previous_artifact.clone(),
        });
        if let Some(needle) = &self.panic_on {
            if brief.description_or_spec.contains(needle.as_str()) {
                panic!("renderer crashed on {}", needle);
            }
        }
        if let Some(token) = &self.cancel_on_render {
            token.cancel();
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.outputs.lock().unwrap().pop_front();
        self.finished.fetch_add(1, Ordering::SeqCst);
        next.or_else(|| self.always.clone())
            .unwrap_or_else(|| RenderOutput::failure("", "no output queued"))
    }
}

// =============================================================================
// Object Stores
// =============================================================================

/// Object store that keeps uploads in memory.
pub struct MemoryStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail: false,
        }
    }

    /// Store whose every upload is rejected upstream.
    pub fn failing() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            fail: true,
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    /// First stored object whose key starts with `prefix`.
    pub fn get_prefixed(&self, prefix: &str) -> Option<Vec<u8>> {
        self.objects
            .lock()
            .unwrap()
            .iter()
            .find(|(key, _)| key.starts_with(prefix))
            .map(|(_, bytes)| bytes.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn upload(&self, bytes: Vec<u8>, key: &str) -> Result<String, StorageError> {
        if self.fail {
            return Err(StorageError::Upstream {
                status: 503,
                message: "store unavailable".to_string(),
            });
        }
        self.objects.lock().unwrap().insert(key.to_string(), bytes);
        Ok(key.to_string())
    }
}

// =============================================================================
// Pipeline Builders
// =============================================================================

/// One scripted agent per model stage plus one stub per engine.
pub struct Fixture {
    pub classifier: Arc<QueueAgent>,
    pub selector: Arc<QueueAgent>,
    pub reviewer: Arc<QueueAgent>,
    pub schematic: Arc<StubRenderer>,
    pub code: Arc<StubRenderer>,
    pub generative: Arc<StubRenderer>,
    pub store: Arc<MemoryStore>,
}

impl Fixture {
    pub fn new(classifier: QueueAgent, selector: QueueAgent, reviewer: QueueAgent) -> Self {
        Self {
            classifier: classifier.into_arc(),
            selector: selector.into_arc(),
            reviewer: reviewer.into_arc(),
            schematic: StubRenderer::new(ToolName::DrawSchematic).into_arc(),
            code: StubRenderer::new(ToolName::PlotWithCode).into_arc(),
            generative: StubRenderer::new(ToolName::GenerateImage).into_arc(),
            store: MemoryStore::new().into(),
        }
    }

    pub fn with_schematic(mut self, renderer: StubRenderer) -> Self {
        self.schematic = renderer.into_arc();
        self
    }

    pub fn with_code(mut self, renderer: StubRenderer) -> Self {
        self.code = renderer.into_arc();
        self
    }

    pub fn with_generative(mut self, renderer: StubRenderer) -> Self {
        self.generative = renderer.into_arc();
        self
    }

    pub fn with_store(mut self, store: MemoryStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    pub fn pipeline(&self) -> DiagramPipeline {
        let timeout = Duration::from_secs(5);
        DiagramPipeline::new(
            DomainClassifier::new(self.classifier.clone(), "classifier-model", timeout),
            ToolSelector::new(self.selector.clone(), "selector-model", timeout),
            RenderEngines::new(
                self.schematic.clone(),
                self.code.clone(),
                self.generative.clone(),
            )
            .with_timeout(timeout),
            Reviewer::new(self.reviewer.clone(), "reviewer-model", timeout),
            self.store.clone(),
        )
        .with_max_attempts(3)
        .with_publish_timeout(timeout)
    }

    pub fn total_renders(&self) -> usize {
        self.schematic.call_count() + self.code.call_count() + self.generative.call_count()
    }
}
