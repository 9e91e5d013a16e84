//! Model endpoint and per-stage model configuration

use serde::{Deserialize, Serialize};

/// Wire protocol spoken by an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointType {
    /// OpenAI API (Bearer key, chat + image generation)
    OpenAI,
    /// Keyless OpenAI-compatible server (chat only)
    Generic,
}

/// A model endpoint other sections refer to by name
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub endpoint_type: EndpointType,
    /// Environment variable holding the API key
    #[serde(default)]
    pub api_key_env: Option<String>,
    /// Whether a generic endpoint's model accepts images
    #[serde(default)]
    pub vision: bool,
}

impl EndpointConfig {
    pub fn openai_default() -> Self {
        Self {
            name: "openai".to_string(),
            url: "https://api.openai.com".to_string(),
            endpoint_type: EndpointType::OpenAI,
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            vision: true,
        }
    }
}

/// Model used by one chat-based stage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageModelConfig {
    pub endpoint: String,
    pub model: String,
    pub timeout_seconds: u64,
}

impl StageModelConfig {
    fn new(model: &str, timeout_seconds: u64) -> Self {
        Self {
            endpoint: "openai".to_string(),
            model: model.to_string(),
            timeout_seconds,
        }
    }
}

/// Image generation model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageModelConfig {
    pub endpoint: String,
    pub model: String,
    /// Requested size, e.g. "1024x1024"
    pub size: String,
    pub timeout_seconds: u64,
}

impl Default for ImageModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "openai".to_string(),
            model: "gpt-image-1".to_string(),
            size: "1024x1024".to_string(),
            timeout_seconds: 120,
        }
    }
}

/// Per-stage model selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Cheap, fast model for domain classification
    pub classifier: StageModelConfig,
    /// Tool-calling model that decides whether and how to draw
    pub selector: StageModelConfig,
    /// Code and markup generation for the code-based engines
    pub codegen: StageModelConfig,
    /// Vision model for review
    pub reviewer: StageModelConfig,
    pub image: ImageModelConfig,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            classifier: StageModelConfig::new("gpt-4o-mini", 10),
            selector: StageModelConfig::new("gpt-4o", 60),
            codegen: StageModelConfig::new("gpt-4o", 90),
            reviewer: StageModelConfig::new("gpt-4o", 60),
            image: ImageModelConfig::default(),
        }
    }
}

impl ModelsConfig {
    /// `(field, endpoint)` pairs for validation
    pub fn endpoint_refs(&self) -> [(&'static str, &str); 5] {
        [
            ("models.classifier.endpoint", &self.classifier.endpoint),
            ("models.selector.endpoint", &self.selector.endpoint),
            ("models.codegen.endpoint", &self.codegen.endpoint),
            ("models.reviewer.endpoint", &self.reviewer.endpoint),
            ("models.image.endpoint", &self.image.endpoint),
        ]
    }
}
