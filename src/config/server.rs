//! Server configuration

use serde::{Deserialize, Serialize};

/// HTTP server configuration for `plotwise serve`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for one `POST /v1/diagrams` batch
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8700,
            request_timeout_seconds: 900,
        }
    }
}
