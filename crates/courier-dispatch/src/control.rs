// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scheduler control use case behind the REST start/stop/status routes.
//!
//! Unlike [`Scheduler`], which treats repeated start/stop as no-ops, this
//! layer reports them to the caller as usage errors. The decision comes from
//! the scheduler's own transition result, never from a prior `is_running`
//! read, so concurrent callers cannot both succeed.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use courier_core::CourierError;

use crate::scheduler::Scheduler;

/// Lifecycle state as reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Running,
    Stopped,
}

/// `{status, message}` answer for scheduler control calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
    pub status: RunState,
    pub message: String,
}

impl SchedulerStatus {
    fn new(status: RunState, message: &str) -> Self {
        Self {
            status,
            message: message.to_string(),
        }
    }
}

pub struct SchedulerControl {
    scheduler: Arc<Scheduler>,
}

impl SchedulerControl {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    pub async fn start(&self) -> Result<SchedulerStatus, CourierError> {
        if !self.scheduler.start().await? {
            warn!("attempted to start scheduler that is already running");
            return Err(CourierError::SchedulerAlreadyRunning);
        }
        info!("scheduler started via control");
        Ok(SchedulerStatus::new(
            RunState::Running,
            "Scheduler started successfully",
        ))
    }

    pub async fn stop(&self) -> Result<SchedulerStatus, CourierError> {
        if !self.scheduler.stop().await? {
            warn!("attempted to stop scheduler that is not running");
            return Err(CourierError::SchedulerNotRunning);
        }
        info!("scheduler stopped via control");
        Ok(SchedulerStatus::new(
            RunState::Stopped,
            "Scheduler stopped successfully",
        ))
    }

    pub fn status(&self) -> SchedulerStatus {
        if self.scheduler.is_running() {
            SchedulerStatus::new(RunState::Running, "Scheduler is currently running")
        } else {
            SchedulerStatus::new(RunState::Stopped, "Scheduler is currently stopped")
        }
    }
}
