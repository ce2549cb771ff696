// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch processor: sends one bounded slice of pending messages.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use courier_core::{
    BatchRunner, CacheEntry, CourierError, Message, MessageCache, MessageSender, MessageStatus,
    MessageStore,
};
use tracing::{debug, error, info, warn};

/// Per-batch counters, logged once per batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Messages fetched from the store.
    pub processed: usize,
    pub sent: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Sends pending messages and records each outcome.
///
/// One bad message never blocks the rest of the batch: delivery failures
/// are written to the message and persistence failures are logged.
pub struct BatchProcessor {
    store: Arc<dyn MessageStore>,
    sender: Arc<dyn MessageSender>,
    cache: Arc<dyn MessageCache>,
}

impl BatchProcessor {
    pub fn new(
        store: Arc<dyn MessageStore>,
        sender: Arc<dyn MessageSender>,
        cache: Arc<dyn MessageCache>,
    ) -> Self {
        Self {
            store,
            sender,
            cache,
        }
    }

    /// Processes up to `limit` pending messages, oldest first.
    ///
    /// Only a failure to fetch the batch is returned as an error.
    pub async fn run(&self, limit: usize) -> Result<BatchSummary, CourierError> {
        let messages = self.store.list_pending(limit).await?;
        let mut summary = BatchSummary {
            processed: messages.len(),
            ..BatchSummary::default()
        };

        if messages.is_empty() {
            debug!("no pending messages");
            return Ok(summary);
        }

        for message in &messages {
            if !message.is_valid_for_sending() {
                warn!(id = %message.id, status = %message.status, "message not valid for sending, skipping");
                summary.skipped += 1;
                continue;
            }

            if self.deliver(message).await {
                summary.sent += 1;
            } else {
                summary.failed += 1;
            }
        }

        info!(
            processed = summary.processed,
            sent = summary.sent,
            failed = summary.failed,
            skipped = summary.skipped,
            "batch processed"
        );
        Ok(summary)
    }

    /// Sends one message and persists the outcome. Returns whether it was sent.
    async fn deliver(&self, message: &Message) -> bool {
        match self.sender.send(&message.to, &message.content).await {
            Ok(message_id) => {
                // The send happened; a failed status write must not requeue it.
                if let Err(e) = self
                    .store
                    .update_status(message.id, MessageStatus::Sent, Some(message_id.clone()), None)
                    .await
                {
                    error!(id = %message.id, %message_id, error = %e, "message sent but status update failed");
                }

                let entry = CacheEntry {
                    message_id,
                    sent_at: Utc::now(),
                };
                if let Err(e) = self.cache.set(message.id, &entry).await {
                    warn!(id = %message.id, error = %e, "failed to cache delivery receipt");
                }
                true
            }
            Err(e) => {
                if e.is_circuit_protection() {
                    warn!(id = %message.id, error = %e, "delivery refused by circuit breaker");
                } else {
                    warn!(id = %message.id, error = %e, "delivery failed");
                }
                if let Err(update_err) = self
                    .store
                    .update_status(message.id, MessageStatus::Failed, None, Some(e.to_string()))
                    .await
                {
                    error!(id = %message.id, error = %update_err, "failed to record delivery failure");
                }
                false
            }
        }
    }
}

#[async_trait]
impl BatchRunner for BatchProcessor {
    async fn process_batch(&self, limit: usize) -> Result<(), CourierError> {
        self.run(limit).await.map(|_| ())
    }
}
