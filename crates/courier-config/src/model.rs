// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Courier.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Courier configuration.
///
/// Every section is optional and defaults to values suitable for a local run.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CourierConfig {
    /// HTTP API listener.
    #[serde(default)]
    pub server: ServerConfig,

    /// Message store.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Optional Redis receipt cache.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Outbound webhook endpoint and transport retry.
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Periodic dispatch scheduler.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Circuit breaker around webhook delivery.
    #[serde(default)]
    pub circuit_breaker: CircuitBreakerSettings,

    /// Log output.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// HTTP API listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    #[serde(default = "default_host")]
    pub host: String,

    /// Bind port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum time to receive a request.
    #[serde(default = "default_io_timeout_secs")]
    pub read_timeout_secs: u64,

    /// Maximum time to produce a response.
    #[serde(default = "default_io_timeout_secs")]
    pub write_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            read_timeout_secs: default_io_timeout_secs(),
            write_timeout_secs: default_io_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Upper bound for handling one request.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs + self.write_timeout_secs)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_io_timeout_secs() -> u64 {
    10
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_true")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: true,
        }
    }
}

fn default_database_path() -> String {
    "courier.db".to_string()
}

/// Redis cache configuration. Disabled by default.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_redis_host")]
    pub host: String,

    #[serde(default = "default_redis_port")]
    pub port: u16,

    #[serde(default)]
    pub password: Option<String>,

    /// Redis logical database index.
    #[serde(default)]
    pub db: i64,

    /// Lifetime of a cached delivery receipt.
    #[serde(default = "default_cache_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_redis_host(),
            port: default_redis_port(),
            password: None,
            db: 0,
            ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// `redis://` connection URL for this configuration.
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) if !password.is_empty() => {
                format!("redis://:{password}@{}:{}/{}", self.host, self.port, self.db)
            }
            _ => format!("redis://{}:{}/{}", self.host, self.port, self.db),
        }
    }
}

fn default_redis_host() -> String {
    "localhost".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_cache_ttl_secs() -> u64 {
    24 * 60 * 60
}

/// Webhook endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WebhookConfig {
    /// Endpoint receiving `POST {to, content}`.
    #[serde(default = "default_webhook_url")]
    pub url: String,

    /// Value of the `x-ins-auth-key` header. `None` omits the header.
    #[serde(default)]
    pub auth_key: Option<String>,

    /// Per-request timeout.
    #[serde(default = "default_webhook_timeout_secs")]
    pub timeout_secs: u64,

    /// Transport attempts per send, including the first.
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    /// Initial backoff between transport attempts.
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,

    /// Backoff ceiling.
    #[serde(default = "default_retry_max_wait_ms")]
    pub retry_max_wait_ms: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: default_webhook_url(),
            auth_key: None,
            timeout_secs: default_webhook_timeout_secs(),
            retry_count: default_retry_count(),
            retry_wait_ms: default_retry_wait_ms(),
            retry_max_wait_ms: default_retry_max_wait_ms(),
        }
    }
}

fn default_webhook_url() -> String {
    "http://localhost:9000/webhook".to_string()
}

fn default_webhook_timeout_secs() -> u64 {
    30
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_wait_ms() -> u64 {
    1_000
}

fn default_retry_max_wait_ms() -> u64 {
    5_000
}

/// Dispatch scheduler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Seconds between ticks.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Messages fetched per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Batch attempts per tick.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between batch attempts within a tick.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Start dispatching as soon as the service boots.
    #[serde(default)]
    pub auto_start: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
            max_retries: default_max_retries(),
            retry_delay_secs: default_retry_delay_secs(),
            auto_start: false,
        }
    }
}

fn default_interval_secs() -> u64 {
    120
}

fn default_batch_size() -> usize {
    2
}

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    5
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CircuitBreakerSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Consecutive failures that open the breaker.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,

    /// Consecutive half-open successes that close it again.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,

    /// Seconds the breaker stays open before probing.
    #[serde(default = "default_half_open_after_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_concurrent_probes")]
    pub max_concurrent_probes: u32,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: default_failure_threshold(),
            success_threshold: default_success_threshold(),
            timeout_secs: default_half_open_after_secs(),
            max_concurrent_probes: default_max_concurrent_probes(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_success_threshold() -> u32 {
    3
}

fn default_half_open_after_secs() -> u64 {
    10
}

fn default_max_concurrent_probes() -> u32 {
    1
}

/// Log output configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// `text` for human-readable lines, `json` for one JSON object per event.
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_true() -> bool {
    true
}
