// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the webhook endpoint.

use serde::{Deserialize, Serialize};

/// Body POSTed to the webhook.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookRequest<'a> {
    pub to: &'a str,
    pub content: &'a str,
}

/// Successful webhook acknowledgement.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookResponse {
    #[serde(default)]
    pub message: String,
    #[serde(rename = "messageId")]
    pub message_id: String,
}
