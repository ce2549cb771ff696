// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Contracts between the scheduler, the batch processor and the delivery client.

use async_trait::async_trait;

use crate::error::CourierError;

/// Delivers one message to the external endpoint.
#[async_trait]
pub trait MessageSender: Send + Sync + 'static {
    /// Sends `content` to `to` and returns the external delivery id.
    async fn send(&self, to: &str, content: &str) -> Result<String, CourierError>;
}

/// Processes one bounded batch of pending work.
#[async_trait]
pub trait BatchRunner: Send + Sync + 'static {
    /// Handles up to `limit` pending messages.
    ///
    /// An error means the batch could not start at all. Individual message
    /// failures are recorded on the messages and never surface here.
    async fn process_batch(&self, limit: usize) -> Result<(), CourierError>;
}
