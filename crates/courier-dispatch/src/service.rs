// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message creation and sent-message queries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use courier_core::{CourierError, Message, MessageStore, NewMessage};

const DEFAULT_PAGE_SIZE: i64 = 10;
const MAX_PAGE_SIZE: i64 = 100;

/// Paging query parameters; absent values take defaults.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageRequest {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl PageRequest {
    /// Validated `(page, limit)`.
    pub fn resolve(self) -> Result<(u64, u64), CourierError> {
        let page = self.page.unwrap_or(1);
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE);
        if page < 1 {
            return Err(CourierError::Validation("page must be at least 1".into()));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&limit) {
            return Err(CourierError::Validation(format!(
                "limit must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        Ok((page as u64, limit as u64))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationInfo {
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SentMessagesPage {
    pub data: Vec<Message>,
    pub pagination: PaginationInfo,
}

pub struct MessageService {
    store: Arc<dyn MessageStore>,
}

impl MessageService {
    pub fn new(store: Arc<dyn MessageStore>) -> Self {
        Self { store }
    }

    /// Validates and enqueues a new pending message.
    pub async fn create(&self, request: NewMessage) -> Result<Message, CourierError> {
        let message = Message::new(request)?;
        self.store.create(&message).await?;
        info!(id = %message.id, "message created");
        Ok(message)
    }

    /// One page of sent messages, most recent first.
    pub async fn sent_messages(&self, request: PageRequest) -> Result<SentMessagesPage, CourierError> {
        let (page, limit) = request.resolve()?;
        let total = self.store.count_sent().await?;
        let offset = (page - 1).saturating_mul(limit);
        let data = self
            .store
            .list_sent(
                usize::try_from(offset).unwrap_or(usize::MAX),
                limit as usize,
            )
            .await?;

        Ok(SentMessagesPage {
            data,
            pagination: PaginationInfo {
                page,
                page_size: limit,
                total,
                total_pages: total.div_ceil(limit),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_core::{MessageStatus, NewMessage};
    use courier_storage::MemoryMessageStore;

    fn new_message(content: &str) -> NewMessage {
        NewMessage {
            to: "+905551111111".into(),
            content: content.into(),
        }
    }

    #[test]
    fn page_defaults() {
        assert_eq!(PageRequest::default().resolve().unwrap(), (1, 10));
    }

    #[test]
    fn page_bounds() {
        let bad_page = PageRequest { page: Some(0), limit: None };
        assert_eq!(bad_page.resolve().unwrap_err().code(), "VALIDATION_ERROR");

        let too_big = PageRequest { page: None, limit: Some(101) };
        assert!(too_big.resolve().is_err());

        let max = PageRequest { page: Some(3), limit: Some(100) };
        assert_eq!(max.resolve().unwrap(), (3, 100));
    }

    #[tokio::test]
    async fn create_persists_pending_message() {
        let store = Arc::new(MemoryMessageStore::new());
        let service = MessageService::new(store.clone());

        let msg = service.create(new_message("hello")).await.unwrap();
        assert_eq!(msg.status, MessageStatus::Pending);
        assert_eq!(store.get(msg.id).await.unwrap().unwrap().content, "hello");
    }

    #[tokio::test]
    async fn create_rejects_long_content_without_storing() {
        let store = Arc::new(MemoryMessageStore::new());
        let service = MessageService::new(store.clone());

        let err = service.create(new_message(&"x".repeat(161))).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_MESSAGE_CONTENT");
        assert!(store.all().await.is_empty());
    }

    #[tokio::test]
    async fn sent_page_math() {
        let store = Arc::new(MemoryMessageStore::new());
        let service = MessageService::new(store.clone());
        for i in 0..5 {
            let msg = service.create(new_message(&format!("m{i}"))).await.unwrap();
            store
                .update_status(msg.id, MessageStatus::Sent, Some(format!("ext-{i}")), None)
                .await
                .unwrap();
        }

        let page = service
            .sent_messages(PageRequest { page: Some(3), limit: Some(2) })
            .await
            .unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(
            page.pagination,
            PaginationInfo { page: 3, page_size: 2, total: 5, total_pages: 3 }
        );
    }

    #[tokio::test]
    async fn empty_store_has_zero_pages() {
        let service = MessageService::new(Arc::new(MemoryMessageStore::new()));
        let page = service.sent_messages(PageRequest::default()).await.unwrap();
        assert!(page.data.is_empty());
        assert_eq!(page.pagination.total_pages, 0);
    }
}
