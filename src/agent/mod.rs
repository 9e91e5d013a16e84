//! Model access layer.
//!
//! This module provides the `ModelAgent` trait and the OpenAI-compatible
//! implementations used by every model-backed stage: classification, tool
//! selection, code generation, image generation and visual review.

use async_trait::async_trait;
use std::time::Duration;

pub mod error;
pub mod factory;
pub mod generic;
pub mod openai;
pub mod parse;
#[cfg(test)]
pub(crate) mod testing;
pub mod types;

// Re-export key types for convenience
pub use error::AgentError;
pub use types::{
    AgentCapabilities, AgentProfile, ChatCompletionRequest, ChatCompletionResponse, ChatMessage,
    ContentPart, ImageGenerationRequest, MessageContent, ToolCall, ToolDefinition,
};

/// Unified interface for model endpoints.
///
/// # Object Safety
///
/// This trait is object-safe and designed to be used as `Arc<dyn ModelAgent>`.
/// All async methods use `async_trait` for compatibility with trait objects.
///
/// # Cancellation Safety
///
/// Dropping a returned future aborts the in-flight HTTP request.
#[async_trait]
pub trait ModelAgent: Send + Sync + 'static {
    /// Unique identifier for this agent instance (the endpoint name from config).
    fn id(&self) -> &str;

    /// Human-readable name for logging.
    fn name(&self) -> &str;

    /// Agent profile with type and capabilities.
    fn profile(&self) -> AgentProfile;

    /// Execute a non-streaming chat completion.
    ///
    /// # Returns
    ///
    /// - `Ok(ChatCompletionResponse)` on success
    /// - `Err(AgentError::Upstream)` if the endpoint returned 4xx/5xx
    /// - `Err(AgentError::Network)` if the connection failed
    /// - `Err(AgentError::Timeout)` if the request exceeded `timeout`
    /// - `Err(AgentError::InvalidResponse)` if the body is not OpenAI format
    async fn chat_completion(
        &self,
        request: ChatCompletionRequest,
        timeout: Duration,
    ) -> Result<ChatCompletionResponse, AgentError>;

    /// Generate one raster image and return its encoded bytes.
    ///
    /// Default implementation returns `Unsupported`.
    async fn generate_image(
        &self,
        _request: ImageGenerationRequest,
        _timeout: Duration,
    ) -> Result<Vec<u8>, AgentError> {
        Err(AgentError::Unsupported("generate_image"))
    }
}
