//! Object store publish step.
//!
//! Accepted diagrams are uploaded once under a key of the form
//! `{key_prefix}/{question_id}/{uuid}.png`; the returned storage key is what
//! gets copied into the question record.

pub mod fs;
pub mod http;

pub use fs::FsObjectStore;
pub use http::HttpObjectStore;

use crate::config::{StorageBackend, StorageConfig};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while publishing an image.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Local filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection to a remote store failed.
    #[error("Network error: {0}")]
    Network(String),

    /// Remote store answered with an error status.
    #[error("Store returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Key is empty or escapes the store root.
    #[error("Invalid object key: {0}")]
    InvalidKey(String),

    /// Store could not be built from configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Publish target for accepted diagrams.
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Upload `bytes` under `key` and return the storage key to record.
    async fn upload(&self, bytes: Vec<u8>, key: &str) -> Result<String, StorageError>;
}

/// Build a fresh key for one question's diagram.
pub fn object_key(prefix: &str, question_id: &str) -> String {
    let prefix = prefix.trim_matches('/');
    let id = sanitize_segment(question_id);
    let name = uuid::Uuid::new_v4();
    if prefix.is_empty() {
        format!("{}/{}.png", id, name)
    } else {
        format!("{}/{}/{}.png", prefix, id, name)
    }
}

fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "question".to_string()
    } else {
        cleaned
    }
}

/// Reject keys that are empty, absolute or contain `..` segments.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey("empty key".to_string()));
    }
    if key.starts_with('/') || key.contains('\\') {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    if key.split('/').any(|s| s.is_empty() || s == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Create the configured store.
pub fn create_store(
    config: &StorageConfig,
    client: Arc<Client>,
) -> Result<Arc<dyn ObjectStore>, StorageError> {
    match config.backend {
        StorageBackend::Filesystem => Ok(Arc::new(FsObjectStore::new(config.root.clone()))),
        StorageBackend::Http => {
            let url = config
                .url
                .clone()
                .ok_or_else(|| StorageError::Configuration("storage.url is required".to_string()))?;
            let api_key = match &config.api_key_env {
                Some(var) => Some(std::env::var(var).map_err(|_| {
                    StorageError::Configuration(format!("environment variable {} is not set", var))
                })?),
                None => None,
            };
            Ok(Arc::new(HttpObjectStore::new(url, api_key, client)))
        }
    }
}
