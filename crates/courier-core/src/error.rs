// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Courier dispatch pipeline.

use thiserror::Error;
use uuid::Uuid;

/// The primary error type used across Courier crates.
///
/// Every variant carries a stable machine-readable code (see [`CourierError::code`])
/// which the REST layer surfaces to clients alongside an HTTP status.
#[derive(Debug, Error)]
pub enum CourierError {
    /// Configuration errors (invalid values, unusable settings at wiring time).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, row decoding).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cache backend errors. Never fatal to message processing.
    #[error("cache error: {message}")]
    Cache {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Request validation failed.
    #[error("validation error: {0}")]
    Validation(String),

    /// Message content is longer than the permitted limit.
    #[error("message content exceeds character limit")]
    InvalidMessageContent,

    /// No message with the given id exists.
    #[error("message not found: {0}")]
    MessageNotFound(Uuid),

    /// Transport-level webhook failure (connection refused, timeout, bad response body).
    #[error("webhook error: {message}")]
    Webhook {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The webhook endpoint answered with a non-2xx status.
    #[error("webhook request failed with status {status}: {body}")]
    WebhookRejected { status: u16, body: String },

    /// Delivery refused locally because the circuit breaker is open.
    #[error("webhook service is temporarily unavailable (circuit open)")]
    CircuitOpen,

    /// Delivery refused locally because the half-open probe limit is reached.
    #[error("webhook service is temporarily unavailable (circuit half-open)")]
    CircuitHalfOpen,

    /// `start` was requested while the scheduler is running.
    #[error("scheduler is already running")]
    SchedulerAlreadyRunning,

    /// `stop` was requested while the scheduler is stopped.
    #[error("scheduler is not running")]
    SchedulerNotRunning,

    /// The scheduler was started without a batch processor attached.
    #[error("message processor not set")]
    ProcessorNotSet,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CourierError {
    /// Stable error code exposed to API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Storage { .. } => "DATABASE_ERROR",
            Self::Cache { .. } => "CACHE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidMessageContent => "INVALID_MESSAGE_CONTENT",
            Self::MessageNotFound(_) => "MESSAGE_NOT_FOUND",
            Self::Webhook { .. } | Self::WebhookRejected { .. } => "WEBHOOK_ERROR",
            Self::CircuitOpen => "WEBHOOK_CIRCUIT_OPEN",
            Self::CircuitHalfOpen => "WEBHOOK_CIRCUIT_HALF_OPEN",
            Self::SchedulerAlreadyRunning => "SCHEDULER_ALREADY_RUNNING",
            Self::SchedulerNotRunning => "SCHEDULER_NOT_RUNNING",
            Self::ProcessorNotSet => "PROCESSOR_NOT_SET",
            Self::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// HTTP status the REST layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_)
            | Self::InvalidMessageContent
            | Self::SchedulerAlreadyRunning
            | Self::SchedulerNotRunning => 400,
            Self::MessageNotFound(_) => 404,
            Self::Webhook { .. } | Self::WebhookRejected { .. } => 502,
            Self::CircuitOpen | Self::CircuitHalfOpen => 503,
            Self::Config(_)
            | Self::Storage { .. }
            | Self::Cache { .. }
            | Self::ProcessorNotSet
            | Self::Internal(_) => 500,
        }
    }

    /// True for refusals issued by the circuit breaker rather than the endpoint.
    pub fn is_circuit_protection(&self) -> bool {
        matches!(self, Self::CircuitOpen | Self::CircuitHalfOpen)
    }

    /// A status change requested for a message that already reached `status`.
    pub fn already_final(id: Uuid, status: crate::types::MessageStatus) -> Self {
        Self::Validation(format!("message {id} is already {status}"))
    }

    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Storage {
            source: Box::new(err),
        }
    }
}
