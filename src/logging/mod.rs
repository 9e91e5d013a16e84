//! Structured logging helpers
//!
//! Filter directive construction, privacy-safe content previews and
//! correlation ids for batches.

pub mod fields;
pub mod ids;

pub use fields::{extract_tokens, truncate_preview, ContentLogging};
pub use ids::generate_run_id;

/// Build filter directives string from LoggingConfig
///
/// Constructs a tracing filter string that includes the base log level
/// and any component-specific log levels configured in the LoggingConfig.
///
/// # Examples
///
/// ```
/// use plotwise::config::logging::{LogFormat, LoggingConfig};
/// use plotwise::logging::build_filter_directives;
/// use std::collections::HashMap;
///
/// let mut component_levels = HashMap::new();
/// component_levels.insert("review".to_string(), "debug".to_string());
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Pretty,
///     component_levels: Some(component_levels),
///     enable_content_logging: false,
///     content_preview_chars: 100,
/// };
///
/// let filter_str = build_filter_directives(&config);
/// assert_eq!(filter_str, "info,plotwise::review=debug");
/// ```
pub fn build_filter_directives(config: &crate::config::LoggingConfig) -> String {
    let mut filter_str = config.level.clone();

    if let Some(component_levels) = &config.component_levels {
        let mut components: Vec<_> = component_levels.iter().collect();
        components.sort();
        for (component, level) in components {
            filter_str.push_str(&format!(",plotwise::{}={}", component, level));
        }
    }

    filter_str
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggingConfig;
    use std::collections::HashMap;

    #[test]
    fn test_filter_directives_without_components() {
        let config = LoggingConfig::default();
        assert_eq!(build_filter_directives(&config), "info");
    }

    #[test]
    fn test_filter_directives_are_sorted() {
        let mut levels = HashMap::new();
        levels.insert("render".to_string(), "trace".to_string());
        levels.insert("classifier".to_string(), "debug".to_string());
        let config = LoggingConfig {
            level: "warn".to_string(),
            component_levels: Some(levels),
            ..LoggingConfig::default()
        };

        assert_eq!(
            build_filter_directives(&config),
            "warn,plotwise::classifier=debug,plotwise::render=trace"
        );
    }
}
