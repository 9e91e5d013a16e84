//! HTTP object store: one `PUT {base_url}/{key}` per upload.

use super::{validate_key, ObjectStore, StorageError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::debug;

pub struct HttpObjectStore {
    base_url: String,
    api_key: Option<String>,
    client: Arc<Client>,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>, client: Arc<Client>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    fn name(&self) -> &str {
        "http"
    }

    async fn upload(&self, bytes: Vec<u8>, key: &str) -> Result<String, StorageError> {
        validate_key(key)?;
        let url = format!("{}/{}", self.base_url, key);
        let content_type = mime_guess::from_path(key).first_or_octet_stream();
        let size = bytes.len();

        let mut builder = self
            .client
            .put(&url)
            .header("content-type", content_type.as_ref())
            .body(bytes);
        if let Some(api_key) = &self.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StorageError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(StorageError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        debug!(key, bytes = size, status = status.as_u16(), "Uploaded object");
        Ok(key.to_string())
    }
}
