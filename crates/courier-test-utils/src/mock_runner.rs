// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch runner that counts invocations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use courier_core::{BatchRunner, CourierError};

/// Counts `process_batch` calls and fails the first `fail_first` of them.
#[derive(Debug, Default)]
pub struct CountingRunner {
    calls: AtomicUsize,
    fail_first: usize,
    delay: Option<Duration>,
}

impl CountingRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// The first `n` calls return a storage error.
    pub fn failing_first(n: usize) -> Self {
        Self {
            fail_first: n,
            ..Self::default()
        }
    }

    pub fn always_failing() -> Self {
        Self::failing_first(usize::MAX)
    }

    /// Each call takes `delay` to complete.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BatchRunner for CountingRunner {
    async fn process_batch(&self, _limit: usize) -> Result<(), CourierError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if n <= self.fail_first {
            return Err(CourierError::Storage {
                source: format!("scripted batch failure #{n}").into(),
            });
        }
        Ok(())
    }
}
