//! OpenAI agent implementation.

use super::types::ImageGenerationResponse;
use super::{
    AgentCapabilities, AgentError, AgentProfile, ChatCompletionRequest, ChatCompletionResponse,
    ImageGenerationRequest, ModelAgent,
};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

/// OpenAI agent implementation.
///
/// Handles OpenAI cloud API calls with API key authentication:
/// - Chat completion via POST /v1/chat/completions with Bearer token
/// - Image generation via POST /v1/images/generations (b64_json, URL fallback)
pub struct OpenAIAgent {
    /// Unique agent ID
    id: String,
    /// Human-readable name
    name: String,
    /// Base URL (e.g., "https://api.openai.com")
    base_url: String,
    /// API key for Bearer authentication
    api_key: String,
    /// Shared HTTP client for connection pooling
    client: Arc<Client>,
}

impl OpenAIAgent {
    pub fn new(
        id: String,
        name: String,
        base_url: String,
        api_key: String,
        client: Arc<Client>,
    ) -> Self {
        Self {
            id,
            name,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }
}

/// POST a chat completion to an OpenAI-compatible endpoint.
pub(super) async fn post_chat_completion(
    client: &Client,
    base_url: &str,
    auth: Option<&str>,
    request: &ChatCompletionRequest,
    timeout: Duration,
) -> Result<ChatCompletionResponse, AgentError> {
    let url = format!("{}/v1/chat/completions", base_url);

    let mut builder = client.post(&url).json(request).timeout(timeout);
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }

    let response = builder
        .send()
        .await
        .map_err(|e| AgentError::from_reqwest(e, timeout))?;

    let status = response.status();
    if !status.is_success() {
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(AgentError::Upstream {
            status: status.as_u16(),
            message: error_body,
        });
    }

    response.json().await.map_err(|e| {
        if e.is_timeout() {
            AgentError::Timeout(timeout.as_millis() as u64)
        } else {
            AgentError::InvalidResponse(format!("Failed to parse completion response: {}", e))
        }
    })
}

#[async_trait]
impl ModelAgent for OpenAIAgent {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn profile(&self) -> AgentProfile {
        AgentProfile {
            backend_type: "openai".to_string(),
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
        timeout: Duration,
    ) -> Result<ChatCompletionResponse, AgentError> {
        let auth = format!("Bearer {}", self.api_key);
        post_chat_completion(&self.client, &self.base_url, Some(&auth), &request, timeout).await
    }

    async fn generate_image(
        &self,
        request: ImageGenerationRequest,
        timeout: Duration,
    ) -> Result<Vec<u8>, AgentError> {
        let url = format!("{}/v1/images/generations", self.base_url);

        let response = self
            .client
            .post(&url)
            .header("authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AgentError::from_reqwest(e, timeout))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AgentError::Upstream {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let body: ImageGenerationResponse = response.json().await.map_err(|e| {
            AgentError::InvalidResponse(format!("Failed to parse image response: {}", e))
        })?;

        let image = body
            .data
            .into_iter()
            .next()
            .ok_or_else(|| AgentError::InvalidResponse("Image response had no data".to_string()))?;

        if let Some(b64) = image.b64_json {
            return BASE64
                .decode(b64.trim())
                .map_err(|e| AgentError::InvalidResponse(format!("Invalid base64 image: {}", e)));
        }

        let Some(image_url) = image.url else {
            return Err(AgentError::InvalidResponse(
                "Image response had neither b64_json nor url".to_string(),
            ));
        };

        // Models sent no response_format may answer with a hosted URL
        let download = self
            .client
            .get(&image_url)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| AgentError::from_reqwest(e, timeout))?;
        if !download.status().is_success() {
            return Err(AgentError::Upstream {
                status: download.status().as_u16(),
                message: format!("Failed to download generated image from {}", image_url),
            });
        }
        let bytes = download
            .bytes()
            .await
            .map_err(|e| AgentError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
