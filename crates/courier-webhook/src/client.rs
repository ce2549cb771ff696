// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery client: transport plus optional circuit breaker.

use std::time::Duration;

use async_trait::async_trait;
use courier_config::model::{CircuitBreakerSettings, WebhookConfig};
use courier_core::{CourierError, MessageSender};
use courier_resilience::{
    CircuitBreaker, CircuitBreakerConfig, CircuitError, CircuitMetrics, CircuitState,
};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tracing::{error, info, warn};

use crate::transport::HttpTransport;
use crate::types::{WebhookRequest, WebhookResponse};

/// Longest response body excerpt kept in a rejection error, in bytes.
const MAX_BODY_EXCERPT: usize = 512;

/// Breaker status as exposed on the API.
#[derive(Debug, Clone)]
pub enum CircuitStatus {
    Enabled(CircuitMetrics),
    Disabled,
}

impl Serialize for CircuitStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Enabled(metrics) => metrics.serialize(serializer),
            Self::Disabled => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("enabled", &false)?;
                map.serialize_entry("message", "Circuit breaker is not enabled")?;
                map.end()
            }
        }
    }
}

/// Sends messages to the configured webhook.
pub struct DeliveryClient {
    transport: HttpTransport,
    breaker: Option<CircuitBreaker>,
}

impl DeliveryClient {
    pub fn new(
        webhook: &WebhookConfig,
        breaker: &CircuitBreakerSettings,
    ) -> Result<Self, CourierError> {
        let transport = HttpTransport::new(webhook)?;
        let breaker = breaker.enabled.then(|| {
            let config = CircuitBreakerConfig {
                failure_threshold: breaker.failure_threshold,
                success_threshold: breaker.success_threshold,
                timeout: Duration::from_secs(breaker.timeout_secs),
                max_concurrent_probes: breaker.max_concurrent_probes,
            };
            info!(timeout_secs = breaker.timeout_secs, "circuit breaker enabled for webhook client");
            CircuitBreaker::new("webhook", config)
        });
        Ok(Self::with_parts(transport, breaker))
    }

    pub fn with_parts(transport: HttpTransport, breaker: Option<CircuitBreaker>) -> Self {
        Self { transport, breaker }
    }

    /// Delivers one message and returns the endpoint's message id.
    pub async fn send(&self, to: &str, content: &str) -> Result<String, CourierError> {
        let Some(breaker) = &self.breaker else {
            return self.send_direct(to, content).await;
        };

        match breaker.execute(|| self.send_direct(to, content)).await {
            Ok(id) => Ok(id),
            Err(CircuitError::Open) => {
                warn!(url = %self.transport.url(), to, "circuit breaker is open, webhook request rejected");
                Err(CourierError::CircuitOpen)
            }
            Err(CircuitError::HalfOpen) => {
                warn!(url = %self.transport.url(), to, "circuit breaker is half-open, webhook request rejected");
                Err(CourierError::CircuitHalfOpen)
            }
            Err(CircuitError::Inner(e)) => Err(e),
        }
    }

    /// Breaker metrics, or [`CircuitStatus::Disabled`].
    pub fn circuit_metrics(&self) -> CircuitStatus {
        match &self.breaker {
            Some(breaker) => CircuitStatus::Enabled(breaker.metrics()),
            None => CircuitStatus::Disabled,
        }
    }

    /// Breaker state; `Closed` when no breaker is configured.
    pub fn circuit_state(&self) -> CircuitState {
        self.breaker
            .as_ref()
            .map(CircuitBreaker::state)
            .unwrap_or_default()
    }

    pub fn breaker(&self) -> Option<&CircuitBreaker> {
        self.breaker.as_ref()
    }

    async fn send_direct(&self, to: &str, content: &str) -> Result<String, CourierError> {
        let response = self.transport.post(&WebhookRequest { to, content }).await?;

        if !(200..300).contains(&response.status) {
            error!(status = response.status, body = %response.body, "webhook request failed");
            return Err(CourierError::WebhookRejected {
                status: response.status,
                body: excerpt(&response.body),
            });
        }

        let parsed: WebhookResponse =
            serde_json::from_str(&response.body).map_err(|e| CourierError::Webhook {
                message: format!("failed to parse webhook response: {e}"),
                source: Some(Box::new(e)),
            })?;
        info!(to, message_id = %parsed.message_id, status = response.status, "webhook request successful");
        Ok(parsed.message_id)
    }
}

#[async_trait]
impl MessageSender for DeliveryClient {
    async fn send(&self, to: &str, content: &str) -> Result<String, CourierError> {
        DeliveryClient::send(self, to, content).await
    }
}

fn excerpt(body: &str) -> String {
    if body.len() <= MAX_BODY_EXCERPT {
        return body.to_string();
    }
    let mut end = MAX_BODY_EXCERPT;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    body[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_cuts_on_char_boundary() {
        let body = format!("{}é tail", "a".repeat(MAX_BODY_EXCERPT - 1));
        let cut = excerpt(&body);
        assert_eq!(cut.len(), MAX_BODY_EXCERPT - 1);
        assert!(cut.chars().all(|c| c == 'a'));
    }

    #[test]
    fn short_body_kept_whole() {
        assert_eq!(excerpt("nope"), "nope");
    }

    #[test]
    fn disabled_status_json() {
        let json = serde_json::to_value(CircuitStatus::Disabled).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"enabled": false, "message": "Circuit breaker is not enabled"})
        );
    }
}
