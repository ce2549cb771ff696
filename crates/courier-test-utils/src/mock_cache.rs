// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache that records every write.

use std::collections::HashMap;

use async_trait::async_trait;
use courier_core::{CacheEntry, CourierError, MessageCache};
use tokio::sync::Mutex;
use uuid::Uuid;

/// In-memory cache; optionally rejects every write.
#[derive(Default)]
pub struct RecordingCache {
    entries: Mutex<HashMap<Uuid, CacheEntry>>,
    fail_writes: bool,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl MessageCache for RecordingCache {
    async fn set(&self, id: Uuid, entry: &CacheEntry) -> Result<(), CourierError> {
        if self.fail_writes {
            return Err(CourierError::Cache {
                message: "cache unavailable".into(),
                source: None,
            });
        }
        self.entries.lock().await.insert(id, entry.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CacheEntry>, CourierError> {
        Ok(self.entries.lock().await.get(&id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn remembers_writes() {
        let cache = RecordingCache::new();
        let id = Uuid::new_v4();
        let entry = CacheEntry {
            message_id: "ext".into(),
            sent_at: Utc::now(),
        };
        cache.set(id, &entry).await.unwrap();
        assert_eq!(cache.get(id).await.unwrap(), Some(entry));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn failing_cache_rejects_writes() {
        let cache = RecordingCache::failing();
        let entry = CacheEntry {
            message_id: "ext".into(),
            sent_at: Utc::now(),
        };
        assert!(cache.set(Uuid::new_v4(), &entry).await.is_err());
        assert!(cache.is_empty().await);
    }
}
