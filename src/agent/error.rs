//! Error types for model calls.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while calling a model endpoint.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Network connectivity error (DNS, connection refused, etc.).
    #[error("Network error: {0}")]
    Network(String),

    /// Request exceeded deadline.
    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    /// Endpoint returned an error response (4xx, 5xx).
    #[error("Backend error {status}: {message}")]
    Upstream { status: u16, message: String },

    /// Method not supported by this agent implementation.
    #[error("Method '{0}' not supported by this agent")]
    Unsupported(&'static str),

    /// Response doesn't match the expected format.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Agent configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl AgentError {
    /// Map a reqwest send error, distinguishing timeouts.
    pub fn from_reqwest(e: reqwest::Error, timeout: Duration) -> Self {
        if e.is_timeout() {
            AgentError::Timeout(timeout.as_millis() as u64)
        } else {
            AgentError::Network(e.to_string())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AgentError::Timeout(_))
    }
}
