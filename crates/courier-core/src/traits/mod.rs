// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capability traits at the seams of the dispatch pipeline.
//!
//! Every trait uses `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` and swapped per environment (SQLite vs. memory store,
//! Redis vs. no-op cache, live webhook vs. stub sender).

pub mod cache;
pub mod dispatch;
pub mod store;

pub use cache::{MessageCache, NoopCache};
pub use dispatch::{BatchRunner, MessageSender};
pub use store::MessageStore;
