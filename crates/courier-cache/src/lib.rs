// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis cache of delivery receipts.
//!
//! After a message is delivered the dispatch pipeline records
//! `{message_id, sent_at}` under `message:{uuid}` with a TTL. The cache is
//! strictly best-effort: callers log its errors and carry on.

pub mod redis_cache;

pub use redis_cache::RedisCache;
