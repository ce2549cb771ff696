// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test doubles for the Courier capability traits.
//!
//! - [`StubSender`]: scripted [`MessageSender`](courier_core::MessageSender) that records calls
//! - [`CountingRunner`]: [`BatchRunner`](courier_core::BatchRunner) that counts batches
//! - [`FailingStore`]: [`MessageStore`](courier_core::MessageStore) that fails on demand
//! - [`RecordingCache`]: [`MessageCache`](courier_core::MessageCache) that remembers writes

pub mod mock_cache;
pub mod mock_runner;
pub mod mock_sender;
pub mod mock_store;

pub use mock_cache::RecordingCache;
pub use mock_runner::CountingRunner;
pub use mock_sender::{SentCall, StubSender};
pub use mock_store::FailingStore;

use courier_core::{CourierError, Message, NewMessage};

/// Builds a valid pending message for tests.
pub fn pending_message(to: &str, content: &str) -> Result<Message, CourierError> {
    Message::new(NewMessage {
        to: to.to_string(),
        content: content.to_string(),
    })
}
