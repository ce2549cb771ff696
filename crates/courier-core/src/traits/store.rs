// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence port for queued messages.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CourierError;
use crate::types::{Message, MessageStatus};

/// Durable storage for messages.
#[async_trait]
pub trait MessageStore: Send + Sync + 'static {
    /// Persists a freshly created message.
    async fn create(&self, message: &Message) -> Result<(), CourierError>;

    /// Returns up to `limit` pending messages, oldest first.
    async fn list_pending(&self, limit: usize) -> Result<Vec<Message>, CourierError>;

    /// Atomically moves a message to `status`.
    ///
    /// When `status` is [`MessageStatus::Sent`] the store stamps `sent_at`
    /// itself. Returns [`CourierError::MessageNotFound`] if no row matched.
    async fn update_status(
        &self,
        id: Uuid,
        status: MessageStatus,
        message_id: Option<String>,
        failure_reason: Option<String>,
    ) -> Result<(), CourierError>;

    /// Number of messages in the `sent` status.
    async fn count_sent(&self) -> Result<u64, CourierError>;

    /// Sent messages, most recently sent first.
    async fn list_sent(&self, offset: usize, limit: usize) -> Result<Vec<Message>, CourierError>;

    /// Looks up a single message.
    async fn get(&self, id: Uuid) -> Result<Option<Message>, CourierError>;
}
