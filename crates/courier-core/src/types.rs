// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message model shared by every Courier crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::error::CourierError;

/// Maximum message content length, in characters.
pub const MAX_CONTENT_LENGTH: usize = 160;

/// Delivery status of a message.
///
/// `Pending` is the only non-terminal status. A message moves to `Sent` or
/// `Failed` exactly once and never leaves that status afterwards.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Pending,
    Sent,
    Failed,
}

impl MessageStatus {
    /// Returns true for `Sent` and `Failed`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

/// Request to enqueue a new message.
#[derive(Debug, Clone, Deserialize)]
pub struct NewMessage {
    pub to: String,
    pub content: String,
}

/// A queued unit of work addressed to the webhook endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub to: String,
    pub content: String,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Message {
    /// Validates `request` and builds a pending message with a fresh id.
    pub fn new(request: NewMessage) -> Result<Self, CourierError> {
        validate_request(&request)?;
        Ok(Self {
            id: Uuid::new_v4(),
            to: request.to,
            content: request.content,
            status: MessageStatus::Pending,
            created_at: Utc::now(),
            sent_at: None,
            message_id: None,
            failure_reason: None,
        })
    }

    /// Whether the message may still be handed to the delivery client.
    pub fn is_valid_for_sending(&self) -> bool {
        self.status == MessageStatus::Pending && content_within_limit(&self.content)
    }

    /// Records a confirmed delivery. An absent `message_id` keeps the current one.
    pub fn mark_sent(&mut self, message_id: Option<String>, sent_at: DateTime<Utc>) {
        self.status = MessageStatus::Sent;
        self.sent_at = Some(sent_at);
        if message_id.is_some() {
            self.message_id = message_id;
        }
    }

    /// Records a failed delivery. An absent `reason` keeps the current one.
    pub fn mark_failed(&mut self, reason: Option<String>) {
        self.status = MessageStatus::Failed;
        if reason.is_some() {
            self.failure_reason = reason;
        }
    }
}

/// Cache record written after a successful delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub message_id: String,
    pub sent_at: DateTime<Utc>,
}

/// Cache key for a message id.
pub fn cache_key(id: &Uuid) -> String {
    format!("message:{id}")
}

fn content_within_limit(content: &str) -> bool {
    content.chars().count() <= MAX_CONTENT_LENGTH
}

fn validate_request(request: &NewMessage) -> Result<(), CourierError> {
    if request.to.trim().is_empty() {
        return Err(CourierError::Validation("recipient `to` is required".into()));
    }
    if request.content.is_empty() {
        return Err(CourierError::Validation("`content` is required".into()));
    }
    if !content_within_limit(&request.content) {
        return Err(CourierError::InvalidMessageContent);
    }
    Ok(())
}
