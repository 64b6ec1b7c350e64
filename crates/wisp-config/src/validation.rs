// SPDX-FileCopyrightText: 2026 Wisp Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes, such as URL schemes, positive durations, and the allowed
//! history limit values.

use crate::diagnostic::ConfigError;
use crate::model::WispConfig;

/// History limit values accepted in config and persisted state.
pub const ALLOWED_HISTORY_LIMITS: &[&str] = &["5", "10", "all"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)`
/// with all collected validation errors (does not fail fast).
pub fn validate_config(config: &WispConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    for (key, url) in [
        ("widget.api_url", &config.widget.api_url),
        ("widget.history_url", &config.widget.history_url),
        ("widget.file_upload_url", &config.widget.file_upload_url),
    ] {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            errors.push(ConfigError::Validation {
                message: format!("{key} must start with http:// or https://, got `{url}`"),
            });
        }
    }

    if !config.widget.ws_url.starts_with("ws://") && !config.widget.ws_url.starts_with("wss://") {
        errors.push(ConfigError::Validation {
            message: format!(
                "widget.ws_url must start with ws:// or wss://, got `{}`",
                config.widget.ws_url
            ),
        });
    }

    if config.connection.base_delay_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "connection.base_delay_ms must be positive".to_string(),
        });
    }

    if config.connection.max_attempts == 0 {
        errors.push(ConfigError::Validation {
            message: "connection.max_attempts must be at least 1".to_string(),
        });
    }

    if !ALLOWED_HISTORY_LIMITS.contains(&config.history.default_limit.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "history.default_limit must be one of {:?}, got `{}`",
                ALLOWED_HISTORY_LIMITS, config.history.default_limit
            ),
        });
    }

    if config.typing.debounce_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "typing.debounce_ms must be positive".to_string(),
        });
    }

    if config.typing.idle_expire_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "typing.idle_expire_ms must be positive".to_string(),
        });
    }

    if config.widget.max_file_size_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "widget.max_file_size_bytes must be positive".to_string(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WispConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn rejects_non_ws_scheme() {
        let mut config = WispConfig::default();
        config.widget.ws_url = "http://localhost:8000/ws/chat/".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("widget.ws_url")));
    }

    #[test]
    fn rejects_zero_backoff_and_attempts() {
        let mut config = WispConfig::default();
        config.connection.base_delay_ms = 0;
        config.connection.max_attempts = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn rejects_unexpected_history_limit() {
        let mut config = WispConfig::default();
        config.history.default_limit = "25".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors
            .iter()
            .any(|e| e.to_string().contains("history.default_limit")));
    }

    #[test]
    fn collects_all_errors_instead_of_failing_fast() {
        let mut config = WispConfig::default();
        config.widget.api_url = "ftp://example".to_string();
        config.typing.debounce_ms = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2);
    }
}
