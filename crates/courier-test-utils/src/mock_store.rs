// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store that fails on demand.

use std::sync::Arc;

use async_trait::async_trait;
use courier_core::{CourierError, Message, MessageStatus, MessageStore};
use courier_storage::MemoryMessageStore;
use uuid::Uuid;

/// Wraps a memory store and injects storage errors.
///
/// [`FailingStore::unavailable`] fails every operation.
/// [`FailingStore::failing_updates`] serves reads and creates normally but
/// fails every `update_status`.
pub struct FailingStore {
    inner: Arc<MemoryMessageStore>,
    fail_reads: bool,
}

impl FailingStore {
    pub fn unavailable() -> Self {
        Self {
            inner: Arc::new(MemoryMessageStore::new()),
            fail_reads: true,
        }
    }

    pub fn failing_updates(inner: Arc<MemoryMessageStore>) -> Self {
        Self {
            inner,
            fail_reads: false,
        }
    }

    pub fn inner(&self) -> &Arc<MemoryMessageStore> {
        &self.inner
    }

    fn check_reads(&self) -> Result<(), CourierError> {
        if self.fail_reads { Err(unavailable()) } else { Ok(()) }
    }
}

fn unavailable() -> CourierError {
    CourierError::Storage {
        source: "store unavailable".into(),
    }
}

#[async_trait]
impl MessageStore for FailingStore {
    async fn create(&self, message: &Message) -> Result<(), CourierError> {
        self.check_reads()?;
        self.inner.create(message).await
    }

    async fn list_pending(&self, limit: usize) -> Result<Vec<Message>, CourierError> {
        self.check_reads()?;
        self.inner.list_pending(limit).await
    }

    async fn update_status(
        &self,
        _id: Uuid,
        _status: MessageStatus,
        _message_id: Option<String>,
        _failure_reason: Option<String>,
    ) -> Result<(), CourierError> {
        Err(unavailable())
    }

    async fn count_sent(&self) -> Result<u64, CourierError> {
        self.check_reads()?;
        self.inner.count_sent().await
    }

    async fn list_sent(&self, offset: usize, limit: usize) -> Result<Vec<Message>, CourierError> {
        self.check_reads()?;
        self.inner.list_sent(offset, limit).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Message>, CourierError> {
        self.check_reads()?;
        self.inner.get(id).await
    }
}
