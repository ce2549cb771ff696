// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted webhook sender.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use courier_core::{CourierError, MessageSender};
use tokio::sync::Mutex;

/// One recorded `send` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentCall {
    pub to: String,
    pub content: String,
}

/// A sender that pops scripted replies, then succeeds with `stub-{n}` ids.
///
/// Recipients registered with [`StubSender::fail_for`] always fail with a
/// 500 rejection, regardless of the script.
#[derive(Default)]
pub struct StubSender {
    replies: Mutex<VecDeque<Result<String, CourierError>>>,
    failing_recipients: Mutex<HashSet<String>>,
    calls: Mutex<Vec<SentCall>>,
    delay: Option<Duration>,
}

impl StubSender {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each call sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Queue the reply for the next unanswered call.
    pub async fn push_reply(&self, reply: Result<String, CourierError>) {
        self.replies.lock().await.push_back(reply);
    }

    /// Make every send to `to` fail.
    pub async fn fail_for(&self, to: &str) {
        self.failing_recipients.lock().await.insert(to.to_string());
    }

    /// Calls received so far, in order.
    pub async fn calls(&self) -> Vec<SentCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl MessageSender for StubSender {
    async fn send(&self, to: &str, content: &str) -> Result<String, CourierError> {
        let n = {
            let mut calls = self.calls.lock().await;
            calls.push(SentCall {
                to: to.to_string(),
                content: content.to_string(),
            });
            calls.len()
        };

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing_recipients.lock().await.contains(to) {
            return Err(CourierError::WebhookRejected {
                status: 500,
                body: format!("stub failure for {to}"),
            });
        }

        self.replies
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok(format!("stub-{n}")))
    }
}
