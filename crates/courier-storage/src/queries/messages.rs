// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message CRUD operations.
//!
//! Timestamps are stored as RFC 3339 text with nanosecond precision in UTC,
//! so lexical order matches chronological order.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use courier_core::{CourierError, Message, MessageStatus};
use rusqlite::{OptionalExtension, params};
use rusqlite::types::Type;
use uuid::Uuid;

use crate::database::{Database, map_tr_err};

const COLUMNS: &str =
    "id, recipient, content, status, created_at, sent_at, message_id, failure_reason";

/// Insert a new message.
pub async fn insert_message(db: &Database, msg: &Message) -> Result<(), CourierError> {
    let msg = msg.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO messages (id, recipient, content, status, created_at, sent_at, message_id, failure_reason)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    msg.id.to_string(),
                    msg.to,
                    msg.content,
                    msg.status.to_string(),
                    format_ts(&msg.created_at),
                    msg.sent_at.as_ref().map(format_ts),
                    msg.message_id,
                    msg.failure_reason,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

/// Pending messages in creation order, oldest first.
pub async fn get_pending_messages(
    db: &Database,
    limit: usize,
) -> Result<Vec<Message>, CourierError> {
    let limit = to_sql_int(limit);
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE status = 'pending'
                 ORDER BY created_at ASC, rowid ASC LIMIT ?1"
            ))?;
            let rows = stmt.query_map(params![limit], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Moves a pending message to `status`, stamping `sent_at` for deliveries.
///
/// `message_id` and `failure_reason` are only overwritten when provided.
/// Messages already in a terminal status are left untouched and reported
/// with [`CourierError::already_final`].
pub async fn update_message_status(
    db: &Database,
    id: Uuid,
    status: MessageStatus,
    message_id: Option<String>,
    failure_reason: Option<String>,
) -> Result<(), CourierError> {
    let sent_at = (status == MessageStatus::Sent).then(|| format_ts(&Utc::now()));
    let outcome = db
        .connection()
        .call(move |conn| -> Result<UpdateOutcome, rusqlite::Error> {
            let affected = conn.execute(
                "UPDATE messages
                 SET status = ?2,
                     sent_at = COALESCE(?3, sent_at),
                     message_id = COALESCE(?4, message_id),
                     failure_reason = COALESCE(?5, failure_reason)
                 WHERE id = ?1 AND status = 'pending'",
                params![
                    id.to_string(),
                    status.to_string(),
                    sent_at,
                    message_id,
                    failure_reason
                ],
            )?;
            if affected > 0 {
                return Ok(UpdateOutcome::Applied);
            }
            let current = conn
                .query_row(
                    "SELECT status FROM messages WHERE id = ?1",
                    params![id.to_string()],
                    |row| row.get::<_, String>(0),
                )
                .optional()?;
            Ok(current.map_or(UpdateOutcome::Missing, UpdateOutcome::Final))
        })
        .await
        .map_err(map_tr_err)?;

    match outcome {
        UpdateOutcome::Applied => Ok(()),
        UpdateOutcome::Missing => Err(CourierError::MessageNotFound(id)),
        UpdateOutcome::Final(found) => {
            let found = MessageStatus::from_str(&found).map_err(CourierError::storage)?;
            Err(CourierError::already_final(id, found))
        }
    }
}

enum UpdateOutcome {
    Applied,
    Missing,
    Final(String),
}

/// Number of delivered messages.
pub async fn count_sent_messages(db: &Database) -> Result<u64, CourierError> {
    let count = db
        .connection()
        .call(|conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE status = 'sent'",
                [],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(u64::try_from(count).unwrap_or_default())
}

/// Delivered messages, most recently sent first.
pub async fn get_sent_messages(
    db: &Database,
    offset: usize,
    limit: usize,
) -> Result<Vec<Message>, CourierError> {
    let offset = to_sql_int(offset);
    let limit = to_sql_int(limit);
    db.connection()
        .call(move |conn| -> Result<Vec<Message>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM messages WHERE status = 'sent'
                 ORDER BY sent_at DESC, rowid DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt.query_map(params![limit, offset], message_from_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}

/// Fetch a message by id.
pub async fn get_message(db: &Database, id: Uuid) -> Result<Option<Message>, CourierError> {
    db.connection()
        .call(move |conn| -> Result<Option<Message>, rusqlite::Error> {
            let mut stmt =
                conn.prepare(&format!("SELECT {COLUMNS} FROM messages WHERE id = ?1"))?;
            let mut rows = stmt.query_map(params![id.to_string()], message_from_row)?;
            rows.next().transpose()
        })
        .await
        .map_err(map_tr_err)
}

fn message_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Message> {
    let id: String = row.get(0)?;
    let status: String = row.get(3)?;
    let created_at: String = row.get(4)?;
    let sent_at: Option<String> = row.get(5)?;

    Ok(Message {
        id: Uuid::parse_str(&id).map_err(|e| conversion_err(0, e))?,
        to: row.get(1)?,
        content: row.get(2)?,
        status: MessageStatus::from_str(&status).map_err(|e| conversion_err(3, e))?,
        created_at: parse_ts(&created_at).map_err(|e| conversion_err(4, e))?,
        sent_at: sent_at
            .as_deref()
            .map(parse_ts)
            .transpose()
            .map_err(|e| conversion_err(5, e))?,
        message_id: row.get(6)?,
        failure_reason: row.get(7)?,
    })
}

fn conversion_err<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw).map(|ts| ts.with_timezone(&Utc))
}

fn to_sql_int(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
