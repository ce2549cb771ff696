// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP transport with per-attempt retry.
//!
//! Network errors and 5xx responses are retried with exponential backoff
//! (`wait * 2^(attempt-1)`, capped at `max_wait`). Anything else is returned
//! to the caller as-is.

use std::time::Duration;

use courier_config::model::WebhookConfig;
use courier_core::CourierError;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::types::WebhookRequest;

/// Header carrying the webhook auth key.
pub const AUTH_HEADER: &str = "x-ins-auth-key";

/// Retry schedule for transport attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Never less than 1.
    pub attempts: u32,
    pub wait: Duration,
    pub max_wait: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            attempts: config.retry_count.max(1),
            wait: Duration::from_millis(config.retry_wait_ms),
            max_wait: Duration::from_millis(config.retry_max_wait_ms),
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.wait.saturating_mul(factor).min(self.max_wait)
    }
}

/// Raw webhook answer after retries.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// reqwest-based transport bound to one webhook URL.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl HttpTransport {
    /// Builds the client with the auth header and request timeout from `config`.
    pub fn new(config: &WebhookConfig) -> Result<Self, CourierError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));
        if let Some(key) = &config.auth_key {
            headers.insert(
                AUTH_HEADER,
                HeaderValue::from_str(key).map_err(|e| {
                    CourierError::Config(format!("invalid webhook auth key header value: {e}"))
                })?,
            );
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| CourierError::Webhook {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            url: config.url.clone(),
            retry: RetryPolicy::from_config(config),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POSTs `request`, retrying transient failures.
    ///
    /// Returns the last response even when it is a 5xx after the final
    /// attempt. Only a network error on the final attempt is an `Err`.
    pub async fn post(&self, request: &WebhookRequest<'_>) -> Result<TransportResponse, CourierError> {
        let mut attempt = 1;
        loop {
            let outcome = self.client.post(&self.url).json(request).send().await;
            let retries_left = attempt < self.retry.attempts;

            match outcome {
                Ok(response) => {
                    let status = response.status().as_u16();
                    debug!(status, attempt, "webhook response received");
                    let body = response.text().await.unwrap_or_default();
                    if status < 500 || !retries_left {
                        return Ok(TransportResponse { status, body });
                    }
                    warn!(status, attempt, "transient webhook error, will retry");
                }
                Err(e) if retries_left => {
                    warn!(error = %e, attempt, "webhook request failed, will retry");
                }
                Err(e) => {
                    return Err(CourierError::Webhook {
                        message: format!("failed to send request: {e}"),
                        source: Some(Box::new(e)),
                    });
                }
            }

            tokio::time::sleep(self.retry.delay_for(attempt)).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_cap() {
        let policy = RetryPolicy {
            attempts: 5,
            wait: Duration::from_secs(1),
            max_wait: Duration::from_secs(5),
        };
        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(4));
        assert_eq!(policy.delay_for(4), Duration::from_secs(5));
        assert_eq!(policy.delay_for(40), Duration::from_secs(5));
    }

    #[test]
    fn zero_retry_count_still_attempts_once() {
        let config = WebhookConfig {
            retry_count: 0,
            ..WebhookConfig::default()
        };
        assert_eq!(RetryPolicy::from_config(&config).attempts, 1);
    }

    #[test]
    fn invalid_auth_key_is_config_error() {
        let config = WebhookConfig {
            auth_key: Some("bad\nkey".into()),
            ..WebhookConfig::default()
        };
        let err = HttpTransport::new(&config).unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }
}
