// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite connection lifecycle.
//!
//! One tokio-rusqlite connection owns the file after setup; every query in
//! this crate is funnelled through it.

use std::fmt::Display;
use std::time::Duration;

use courier_core::CourierError;
use tracing::debug;

use crate::migrations;

/// Handle to the single SQLite writer connection.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` in WAL mode and runs migrations.
    pub async fn open(path: &str) -> Result<Self, CourierError> {
        Self::open_with(path, true).await
    }

    /// Opens the database, choosing whether to switch it to WAL mode.
    ///
    /// Journal mode and migrations are applied on a short-lived blocking
    /// connection before the async writer connection is created.
    pub async fn open_with(path: &str, wal_mode: bool) -> Result<Self, CourierError> {
        let owned = path.to_string();
        tokio::task::spawn_blocking(move || prepare(&owned, wal_mode))
            .await
            .map_err(|e| CourierError::Internal(format!("database setup task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(storage_err)?;
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(Duration::from_secs(5))?;
            conn.pragma_update(None, "foreign_keys", true)?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// The async connection all queries go through.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL and closes the connection.
    pub async fn close(self) -> Result<(), CourierError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)?;
        self.conn.close().await.map_err(storage_err)?;
        debug!("database closed");
        Ok(())
    }
}

fn prepare(path: &str, wal_mode: bool) -> Result<(), CourierError> {
    let mut conn = rusqlite::Connection::open(path).map_err(CourierError::storage)?;
    if wal_mode {
        let mode: String = conn
            .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
            .map_err(CourierError::storage)?;
        debug!(%mode, "journal mode set");
    }
    migrations::run_migrations(&mut conn)
}

/// Maps a failed `Connection::call` into a storage error.
pub(crate) fn map_tr_err<E: Display>(err: E) -> CourierError {
    storage_err(err)
}

fn storage_err<E: Display>(err: E) -> CourierError {
    CourierError::Storage {
        source: err.to_string().into(),
    }
}
