//! In-process agents for unit tests.

use super::{
    AgentCapabilities, AgentError, AgentProfile, ChatCompletionRequest, ChatCompletionResponse,
    ImageGenerationRequest, ModelAgent,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Agent that replays queued replies and records every request it sees.
pub(crate) struct ScriptedAgent {
    replies: Mutex<VecDeque<Result<ChatCompletionResponse, AgentError>>>,
    images: Mutex<VecDeque<Result<Vec<u8>, AgentError>>>,
    pub(crate) requests: Mutex<Vec<ChatCompletionRequest>>,
    delay: Option<Duration>,
}

impl ScriptedAgent {
    pub(crate) fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            images: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            delay: None,
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn reply_text(self, text: &str) -> Self {
        self.reply(Ok(ChatCompletionResponse::from_text("scripted", text)))
    }

    pub(crate) fn reply_tool(self, name: &str, arguments: serde_json::Value) -> Self {
        self.reply(Ok(ChatCompletionResponse::from_tool_call(
            "scripted", name, arguments,
        )))
    }

    pub(crate) fn reply(self, reply: Result<ChatCompletionResponse, AgentError>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub(crate) fn image(self, image: Result<Vec<u8>, AgentError>) -> Self {
        self.images.lock().unwrap().push_back(image);
        self
    }

    pub(crate) fn last_request(&self) -> Option<ChatCompletionRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ModelAgent for ScriptedAgent {
    fn id(&self) -> &str {
        "scripted"
    }

    fn name(&self) -> &str {
        "Scripted"
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "scripted".to_string(),
            capabilities: AgentCapabilities {
                tool_calling: true,
                vision: true,
                image_generation: true,
            },
        }
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
        _timeout: Duration,
    ) -> Result<ChatCompletionResponse, AgentError> {
        self.requests.lock().unwrap().push(request);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Network("script exhausted".to_string())))
    }

    async fn generate_image(
        &self,
        _request: ImageGenerationRequest,
        _timeout: Duration,
    ) -> Result<Vec<u8>, AgentError> {
        self.images
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AgentError::Network("script exhausted".to_string())))
    }
}
