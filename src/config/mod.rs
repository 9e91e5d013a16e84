//! Configuration module for Plotwise
//!
//! Provides layered configuration loading from files, environment variables, and defaults.
//!
//! # Configuration Precedence
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables (`PLOTWISE_*`)
//! 3. Configuration file (TOML)
//! 4. Default values (lowest priority)
//!
//! # Example
//!
//! ```rust
//! use plotwise::config::PlotwiseConfig;
//!
//! let config = PlotwiseConfig::default();
//! assert_eq!(config.server.port, 8700);
//! assert_eq!(config.pipeline.max_attempts, 3);
//!
//! let toml = r#"
//! [pipeline]
//! max_attempts = 5
//! "#;
//! let config: PlotwiseConfig = toml::from_str(toml).unwrap();
//! assert_eq!(config.pipeline.max_attempts, 5);
//! assert_eq!(config.pipeline.concurrency, 4);
//! ```

pub mod endpoint;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod server;

pub use endpoint::{EndpointConfig, EndpointType, ImageModelConfig, ModelsConfig, StageModelConfig};
pub use error::ConfigError;
pub use logging::{LogFormat, LoggingConfig};
pub use pipeline::{
    MarkupCompilerConfig, PipelineConfig, SandboxConfig, StorageBackend, StorageConfig,
};
pub use server::ServerConfig;

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Unified configuration for the diagram pipeline and its server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlotwiseConfig {
    pub server: ServerConfig,
    /// Model endpoints, referenced by name from `[models.*]`
    pub endpoints: Vec<EndpointConfig>,
    pub models: ModelsConfig,
    pub pipeline: PipelineConfig,
    pub sandbox: SandboxConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Default for PlotwiseConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            endpoints: vec![EndpointConfig::openai_default()],
            models: ModelsConfig::default(),
            pipeline: PipelineConfig::default(),
            sandbox: SandboxConfig::default(),
            storage: StorageConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl PlotwiseConfig {
    /// Load configuration from a TOML file
    ///
    /// If path is None, returns default configuration.
    /// If path doesn't exist, returns NotFound error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => {
                if !p.exists() {
                    return Err(ConfigError::NotFound(p.to_path_buf()));
                }
                let content = std::fs::read_to_string(p).map_err(|source| ConfigError::Read {
                    path: p.to_path_buf(),
                    source,
                })?;
                toml::from_str(&content).map_err(|e| ConfigError::Parse {
                    path: p.to_path_buf(),
                    message: e.to_string(),
                })
            }
            None => Ok(Self::default()),
        }
    }

    /// Apply environment variable overrides
    ///
    /// Invalid values are silently ignored (the previous value is kept).
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(port) = std::env::var("PLOTWISE_PORT") {
            if let Ok(p) = port.parse() {
                self.server.port = p;
            }
        }
        if let Ok(host) = std::env::var("PLOTWISE_HOST") {
            self.server.host = host;
        }

        if let Ok(level) = std::env::var("PLOTWISE_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("PLOTWISE_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                self.logging.format = f;
            }
        }

        if let Ok(attempts) = std::env::var("PLOTWISE_MAX_ATTEMPTS") {
            if let Ok(n) = attempts.parse() {
                self.pipeline.max_attempts = n;
            }
        }
        if let Ok(concurrency) = std::env::var("PLOTWISE_CONCURRENCY") {
            if let Ok(n) = concurrency.parse() {
                self.pipeline.concurrency = n;
            }
        }

        self
    }

    /// Look up an endpoint by name
    pub fn endpoint(&self, name: &str) -> Option<&EndpointConfig> {
        self.endpoints.iter().find(|e| e.name == name)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(invalid("server.port", "port must be non-zero"));
        }

        for (i, endpoint) in self.endpoints.iter().enumerate() {
            if endpoint.name.is_empty() {
                return Err(invalid(&format!("endpoints[{}].name", i), "name cannot be empty"));
            }
            if endpoint.url.is_empty() {
                return Err(invalid(&format!("endpoints[{}].url", i), "URL cannot be empty"));
            }
            if self.endpoints[..i].iter().any(|e| e.name == endpoint.name) {
                return Err(invalid(
                    &format!("endpoints[{}].name", i),
                    &format!("duplicate endpoint name '{}'", endpoint.name),
                ));
            }
        }

        for (field, endpoint) in self.models.endpoint_refs() {
            if self.endpoint(endpoint).is_none() {
                return Err(ConfigError::UnknownEndpoint {
                    field: field.to_string(),
                    endpoint: endpoint.to_string(),
                });
            }
        }

        if self.pipeline.max_attempts == 0 {
            return Err(invalid("pipeline.max_attempts", "must be at least 1"));
        }
        if self.pipeline.concurrency == 0 {
            return Err(invalid("pipeline.concurrency", "must be at least 1"));
        }
        if self.sandbox.max_image_dimension < 64 {
            return Err(invalid("sandbox.max_image_dimension", "must be at least 64"));
        }
        if !(self.sandbox.max_aspect_ratio >= 1.0) {
            return Err(invalid("sandbox.max_aspect_ratio", "must be at least 1.0"));
        }
        if self.sandbox.python.trim().is_empty() {
            return Err(invalid("sandbox.python", "interpreter cannot be empty"));
        }
        if self.sandbox.schematic.program.trim().is_empty() {
            return Err(invalid("sandbox.schematic.program", "program cannot be empty"));
        }

        if self.storage.backend == StorageBackend::Http
            && self.storage.url.as_deref().map_or(true, str::is_empty)
        {
            return Err(invalid("storage.url", "required for the http backend"));
        }

        Ok(())
    }
}

fn invalid(field: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        field: field.to_string(),
        message: message.to_string(),
    }
}
