// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed [`MessageStore`].

use async_trait::async_trait;
use courier_config::model::StorageConfig;
use courier_core::{CourierError, Message, MessageStatus, MessageStore};
use tracing::{debug, info};
use uuid::Uuid;

use crate::database::Database;
use crate::queries::messages;

/// Message store persisting to a single SQLite file.
pub struct SqliteMessageStore {
    db: Database,
}

impl SqliteMessageStore {
    /// Opens the configured database and applies migrations.
    pub async fn open(config: &StorageConfig) -> Result<Self, CourierError> {
        let db = Database::open_with(&config.database_path, config.wal_mode).await?;
        info!(path = %config.database_path, "sqlite message store ready");
        Ok(Self::new(db))
    }

    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Flushes the WAL and closes the underlying connection.
    pub async fn close(self) -> Result<(), CourierError> {
        self.db.close().await
    }
}

#[async_trait]
impl MessageStore for SqliteMessageStore {
    async fn create(&self, message: &Message) -> Result<(), CourierError> {
        messages::insert_message(&self.db, message).await?;
        debug!(id = %message.id, "message stored");
        Ok(())
    }

    async fn list_pending(&self, limit: usize) -> Result<Vec<Message>, CourierError> {
        messages::get_pending_messages(&self.db, limit).await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: MessageStatus,
        message_id: Option<String>,
        failure_reason: Option<String>,
    ) -> Result<(), CourierError> {
        messages::update_message_status(&self.db, id, status, message_id, failure_reason).await
    }

    async fn count_sent(&self) -> Result<u64, CourierError> {
        messages::count_sent_messages(&self.db).await
    }

    async fn list_sent(&self, offset: usize, limit: usize) -> Result<Vec<Message>, CourierError> {
        messages::get_sent_messages(&self.db, offset, limit).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Message>, CourierError> {
        messages::get_message(&self.db, id).await
    }
}
