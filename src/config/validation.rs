//! Configuration validation.
//!
//! Serde handles syntax; this module checks value ranges and cross-field
//! consistency. All errors are collected, not just the first.

use thiserror::Error;

use crate::config::schema::{AccessConfig, StorageKind};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    Zero { field: String },

    #[error("retries.max_delay_ms ({max}) is below retries.retry_delay_ms ({base})")]
    DelayCap { base: u64, max: u64 },

    #[error("storage.path must be set for file storage")]
    MissingStoragePath,

    #[error("backend.base_url is invalid: {0}")]
    BaseUrl(String),

    #[error("disclosure.access_type must not be empty")]
    EmptyAccessType,
}

fn non_zero(errors: &mut Vec<ValidationError>, field: &str, value: u64) {
    if value == 0 {
        errors.push(ValidationError::Zero { field: field.to_string() });
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AccessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    non_zero(&mut errors, "rate_limit.default_window_secs", config.rate_limit.default_window_secs);
    for (endpoint, rule) in &config.rate_limit.endpoints {
        non_zero(
            &mut errors,
            &format!("rate_limit.endpoints.{endpoint}.window_secs"),
            rule.window_secs,
        );
    }

    non_zero(&mut errors, "retries.retry_delay_ms", config.retries.retry_delay_ms);
    if let Some(max) = config.retries.max_delay_ms {
        if config.retries.retry_delay_ms > 0 && max < config.retries.retry_delay_ms {
            errors.push(ValidationError::DelayCap {
                base: config.retries.retry_delay_ms,
                max,
            });
        }
    }

    if config.storage.kind == StorageKind::File && config.storage.path.trim().is_empty() {
        errors.push(ValidationError::MissingStoragePath);
    }

    if let Err(e) = url::Url::parse(&config.backend.base_url) {
        errors.push(ValidationError::BaseUrl(e.to_string()));
    }
    non_zero(&mut errors, "backend.timeout_secs", config.backend.timeout_secs);

    if config.disclosure.access_type.trim().is_empty() {
        errors.push(ValidationError::EmptyAccessType);
    }
    non_zero(&mut errors, "disclosure.reveal_window_secs", config.disclosure.reveal_window_secs);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
