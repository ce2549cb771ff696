// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process [`MessageStore`] for tests and ephemeral runs.

use async_trait::async_trait;
use chrono::Utc;
use courier_core::{CourierError, Message, MessageStatus, MessageStore};
use tokio::sync::RwLock;
use uuid::Uuid;

/// Message store holding everything in a vector, in insertion order.
#[derive(Default)]
pub struct MemoryMessageStore {
    messages: RwLock<Vec<Message>>,
}

impl MemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored message.
    pub async fn all(&self) -> Vec<Message> {
        self.messages.read().await.clone()
    }
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
    async fn create(&self, message: &Message) -> Result<(), CourierError> {
        let mut messages = self.messages.write().await;
        if messages.iter().any(|m| m.id == message.id) {
            return Err(CourierError::Storage {
                source: format!("duplicate message id {}", message.id).into(),
            });
        }
        messages.push(message.clone());
        Ok(())
    }

    async fn list_pending(&self, limit: usize) -> Result<Vec<Message>, CourierError> {
        let messages = self.messages.read().await;
        let mut pending: Vec<Message> = messages
            .iter()
            .filter(|m| m.status == MessageStatus::Pending)
            .cloned()
            .collect();
        // Stable sort keeps insertion order for equal timestamps.
        pending.sort_by_key(|m| m.created_at);
        pending.truncate(limit);
        Ok(pending)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: MessageStatus,
        message_id: Option<String>,
        failure_reason: Option<String>,
    ) -> Result<(), CourierError> {
        let mut messages = self.messages.write().await;
        let msg = messages
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(CourierError::MessageNotFound(id))?;

        if msg.status.is_terminal() {
            return Err(CourierError::already_final(id, msg.status));
        }

        match status {
            MessageStatus::Sent => msg.mark_sent(message_id, Utc::now()),
            MessageStatus::Failed => msg.mark_failed(failure_reason),
            MessageStatus::Pending => {}
        }
        Ok(())
    }

    async fn count_sent(&self) -> Result<u64, CourierError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| m.status == MessageStatus::Sent)
            .count() as u64)
    }

    async fn list_sent(&self, offset: usize, limit: usize) -> Result<Vec<Message>, CourierError> {
        let messages = self.messages.read().await;
        let mut sent: Vec<(usize, &Message)> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.status == MessageStatus::Sent)
            .collect();
        sent.sort_by(|(ia, a), (ib, b)| b.sent_at.cmp(&a.sent_at).then(ib.cmp(ia)));
        Ok(sent
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(_, m)| m.clone())
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Message>, CourierError> {
        let messages = self.messages.read().await;
        Ok(messages.iter().find(|m| m.id == id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::NewMessage;

    fn message(to: &str) -> Message {
        Message::new(NewMessage {
            to: to.into(),
            content: "hello".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn pending_respects_limit_and_order() {
        let store = MemoryMessageStore::new();
        let first = message("+100");
        let second = message("+200");
        let third = message("+300");
        for m in [&first, &second, &third] {
            store.create(m).await.unwrap();
        }

        let pending = store.list_pending(2).await.unwrap();
        let ids: Vec<_> = pending.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![first.id, second.id]);
    }

    #[tokio::test]
    async fn update_unknown_id_is_not_found() {
        let store = MemoryMessageStore::new();
        let err = store
            .update_status(Uuid::new_v4(), MessageStatus::Failed, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, CourierError::MessageNotFound(_)));
    }

    #[tokio::test]
    async fn failed_message_cannot_become_sent() {
        let store = MemoryMessageStore::new();
        let m = message("+1");
        store.create(&m).await.unwrap();
        store
            .update_status(m.id, MessageStatus::Failed, None, Some("boom".into()))
            .await
            .unwrap();

        let err = store
            .update_status(m.id, MessageStatus::Sent, Some("ext".into()), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");

        let stored = store.get(m.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Failed);
        assert!(stored.message_id.is_none());
        assert!(stored.sent_at.is_none());
    }

    #[tokio::test]
    async fn sent_listing_newest_first() {
        let store = MemoryMessageStore::new();
        let a = message("+1");
        let b = message("+2");
        store.create(&a).await.unwrap();
        store.create(&b).await.unwrap();
        store
            .update_status(a.id, MessageStatus::Sent, Some("ext-a".into()), None)
            .await
            .unwrap();
        store
            .update_status(b.id, MessageStatus::Sent, Some("ext-b".into()), None)
            .await
            .unwrap();

        let sent = store.list_sent(0, 10).await.unwrap();
        assert_eq!(sent[0].id, b.id);
        assert_eq!(sent[1].id, a.id);
        assert_eq!(store.count_sent().await.unwrap(), 2);
        assert!(store.list_pending(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_create_rejected() {
        let store = MemoryMessageStore::new();
        let m = message("+1");
        store.create(&m).await.unwrap();
        assert!(store.create(&m).await.is_err());
    }
}
