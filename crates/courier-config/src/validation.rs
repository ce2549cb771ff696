// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde cannot express: non-zero counts,
//! well-formed URLs, and known log levels.

use crate::diagnostic::ConfigError;
use crate::model::CourierConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// Validate a deserialized configuration.
///
/// Collects every problem instead of failing on the first one.
pub fn validate_config(config: &CourierConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::validation("server.host must not be empty"));
    }
    if config.server.port == 0 {
        errors.push(ConfigError::validation("server.port must be non-zero"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(ConfigError::validation("storage.database_path must not be empty"));
    }

    if config.cache.enabled && config.cache.host.trim().is_empty() {
        errors.push(ConfigError::validation(
            "cache.host must not be empty when the cache is enabled",
        ));
    }

    let url = config.webhook.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        errors.push(ConfigError::validation(format!(
            "webhook.url `{url}` must start with http:// or https://"
        )));
    }
    if config.webhook.timeout_secs == 0 {
        errors.push(ConfigError::validation("webhook.timeout_secs must be at least 1"));
    }
    if config.webhook.retry_count == 0 {
        errors.push(ConfigError::validation("webhook.retry_count must be at least 1"));
    }
    if config.webhook.retry_max_wait_ms < config.webhook.retry_wait_ms {
        errors.push(ConfigError::validation(format!(
            "webhook.retry_max_wait_ms ({}) must not be below webhook.retry_wait_ms ({})",
            config.webhook.retry_max_wait_ms, config.webhook.retry_wait_ms
        )));
    }

    let scheduler = &config.scheduler;
    if scheduler.interval_secs == 0 {
        errors.push(ConfigError::validation("scheduler.interval_secs must be at least 1"));
    }
    if scheduler.batch_size == 0 {
        errors.push(ConfigError::validation("scheduler.batch_size must be at least 1"));
    }
    if scheduler.max_retries == 0 {
        errors.push(ConfigError::validation("scheduler.max_retries must be at least 1"));
    }

    let breaker = &config.circuit_breaker;
    for (name, value) in [
        ("failure_threshold", breaker.failure_threshold),
        ("success_threshold", breaker.success_threshold),
        ("max_concurrent_probes", breaker.max_concurrent_probes),
    ] {
        if value == 0 {
            errors.push(ConfigError::validation(format!(
                "circuit_breaker.{name} must be at least 1"
            )));
        }
    }
    if breaker.timeout_secs == 0 {
        errors.push(ConfigError::validation(
            "circuit_breaker.timeout_secs must be at least 1",
        ));
    }

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.level `{}` is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }
    if !LOG_FORMATS.contains(&config.logging.format.as_str()) {
        errors.push(ConfigError::validation(format!(
            "logging.format `{}` is not one of {}",
            config.logging.format,
            LOG_FORMATS.join(", ")
        )));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
