// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message persistence for Courier.
//!
//! Provides the SQLite store used in production (single writer connection
//! through tokio-rusqlite, refinery migrations) and an in-memory store for
//! tests and throwaway runs. Both implement [`courier_core::MessageStore`].

pub mod database;
pub mod memory;
pub mod migrations;
pub mod queries;
pub mod sqlite;

pub use database::Database;
pub use memory::MemoryMessageStore;
pub use sqlite::SqliteMessageStore;
