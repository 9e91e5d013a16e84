//! Field helpers for structured logging

use crate::agent::ChatCompletionResponse;
use crate::config::LoggingConfig;

/// Extract token counts from a chat completion response
///
/// Returns `(prompt_tokens, completion_tokens, total_tokens)`, all zero when
/// the endpoint did not report usage.
pub fn extract_tokens(response: &ChatCompletionResponse) -> (u32, u32, u32) {
    if let Some(usage) = &response.usage {
        (
            usage.prompt_tokens,
            usage.completion_tokens,
            usage.total_tokens,
        )
    } else {
        (0, 0, 0)
    }
}

/// Guard for logging question text and model output.
///
/// Questions may be unreleased assessment items, so previews are produced
/// only when `enable_content_logging` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentLogging {
    enabled: bool,
    preview_chars: usize,
}

impl ContentLogging {
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enable_content_logging,
            preview_chars: config.content_preview_chars,
        }
    }

    pub fn disabled() -> Self {
        Self {
            enabled: false,
            preview_chars: 0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Truncated preview, or `None` when content logging is off or `text` is blank.
    ///
    /// ```
    /// use plotwise::config::LoggingConfig;
    /// use plotwise::logging::ContentLogging;
    ///
    /// let config = LoggingConfig { enable_content_logging: true, ..LoggingConfig::default() };
    /// let logging = ContentLogging::from_config(&config);
    /// assert_eq!(logging.preview("Find R_total").as_deref(), Some("Find R_total"));
    ///
    /// assert!(ContentLogging::disabled().preview("Find R_total").is_none());
    /// ```
    pub fn preview(&self, text: &str) -> Option<String> {
        if !self.enabled || text.trim().is_empty() {
            return None;
        }
        Some(truncate_preview(text, self.preview_chars))
    }
}

impl Default for ContentLogging {
    fn default() -> Self {
        Self::disabled()
    }
}

/// Truncate to at most `max_chars` characters, appending `...` when cut.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}
