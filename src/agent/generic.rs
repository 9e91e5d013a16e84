//! Generic OpenAI-compatible agent implementation.
//!
//! Handles keyless local servers (vLLM, llama.cpp, Ollama's OpenAI shim) that
//! expose /v1/chat/completions. Image generation is not available here.

use super::openai::post_chat_completion;
use super::{
    AgentCapabilities, AgentError, AgentProfile, ChatCompletionRequest, ChatCompletionResponse,
    ModelAgent,
};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// Generic OpenAI-compatible agent implementation.
pub struct GenericOpenAIAgent {
    /// Unique agent ID
    id: String,
    /// Human-readable name
    name: String,
    /// Base URL (e.g., "http://localhost:8000")
    base_url: String,
    /// Whether the served model accepts image parts
    vision: bool,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
}

impl GenericOpenAIAgent {
    pub fn new(id: String, name: String, base_url: String, vision: bool, client: Arc<Client>) -> Self {
        Self {
            id,
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            vision,
            client,
        }
    }
}

#[async_trait]
impl ModelAgent for GenericOpenAIAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "generic".to_string(),
            capabilities: AgentCapabilities {
                tool_calling: true,
                vision: self.vision,
                image_generation: false,
            },
        }
    }

    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<ChatCompletionResponse, AgentError> {
        post_chat_completion(&self.client, &self.base_url, None, &request, timeout).await
    }
}
