//! Pipeline, sandbox and storage configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Orchestrator settings
///
/// # Example
///
/// ```toml
/// [pipeline]
/// max_attempts = 3
/// concurrency = 4
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Total render attempts per question, across all engines
    pub max_attempts: u32,
    /// Questions processed in parallel
    pub concurrency: usize,
    /// Wall-clock limit for one engine invocation (model call + execution)
    pub render_timeout_seconds: u64,
    pub publish_timeout_seconds: u64,
    /// Object keys are `{key_prefix}/{question_id}/{uuid}.png`
    pub key_prefix: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            concurrency: 4,
            render_timeout_seconds: 180,
            publish_timeout_seconds: 30,
            key_prefix: "diagrams".to_string(),
        }
    }
}

/// Markup compiler used by the schematic engine.
///
/// `{input}` and `{output}` in `args` are replaced with the source and
/// output file names inside the sandbox directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupCompilerConfig {
    /// Markup language named in the generation prompt
    pub dialect: String,
    pub program: String,
    pub args: Vec<String>,
    pub source_file: String,
}

impl Default for MarkupCompilerConfig {
    fn default() -> Self {
        Self {
            dialect: "Graphviz DOT".to_string(),
            program: "dot".to_string(),
            args: vec![
                "-Tpng".to_string(),
                "-Gdpi=150".to_string(),
                "-o".to_string(),
                "{output}".to_string(),
                "{input}".to_string(),
            ],
            source_file: "diagram.dot".to_string(),
        }
    }
}

/// Sandboxed execution and output bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Interpreter for generated plotting code
    pub python: String,
    /// Wall-clock limit for one sandboxed execution
    pub timeout_seconds: u64,
    /// Longest side of any produced image, in pixels
    pub max_image_dimension: u32,
    /// Images with a longer-to-shorter side ratio above this are padded
    pub max_aspect_ratio: f32,
    pub schematic: MarkupCompilerConfig,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python: "python3".to_string(),
            timeout_seconds: 30,
            max_image_dimension: 1024,
            max_aspect_ratio: 1.6,
            schematic: MarkupCompilerConfig::default(),
        }
    }
}

/// Where published diagrams go
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Filesystem,
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the filesystem backend
    pub root: PathBuf,
    /// Base URL for the HTTP backend; objects are PUT to `{url}/{key}`
    pub url: Option<String>,
    pub api_key_env: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Filesystem,
            root: PathBuf::from("diagram-store"),
            url: None,
            api_key_env: None,
        }
    }
}
