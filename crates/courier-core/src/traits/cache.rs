// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Optional write-through cache of delivery receipts.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::CourierError;
use crate::types::CacheEntry;

/// Cache of delivery receipts keyed by message id.
#[async_trait]
pub trait MessageCache: Send + Sync + 'static {
    /// Stores the receipt for `id`.
    async fn set(&self, id: Uuid, entry: &CacheEntry) -> Result<(), CourierError>;

    /// Fetches the receipt for `id`, if cached.
    async fn get(&self, id: Uuid) -> Result<Option<CacheEntry>, CourierError>;
}

/// Cache used when no cache backend is configured.
///
/// Accepts every write and never returns a hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopCache;

#[async_trait]
impl MessageCache for NoopCache {
    async fn set(&self, _id: Uuid, _entry: &CacheEntry) -> Result<(), CourierError> {
        Ok(())
    }

    async fn get(&self, _id: Uuid) -> Result<Option<CacheEntry>, CourierError> {
        Ok(None)
    }
}
