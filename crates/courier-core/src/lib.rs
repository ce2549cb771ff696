// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for Courier.
//!
//! This crate provides the message model, the error taxonomy and the
//! capability traits every other Courier crate is wired through.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::CourierError;
pub use types::{CacheEntry, MAX_CONTENT_LENGTH, Message, MessageStatus, NewMessage, cache_key};

pub use traits::{BatchRunner, MessageCache, MessageSender, MessageStore, NoopCache};
