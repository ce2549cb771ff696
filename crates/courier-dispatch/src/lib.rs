// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The dispatch pipeline: batch processing, the periodic scheduler, and the
//! use cases the REST layer calls.
//!
//! Control flow for one tick:
//! scheduler tick → retry envelope → [`BatchProcessor::run`] → for each
//! message: [`MessageSender::send`](courier_core::MessageSender::send) → persist outcome.

pub mod control;
pub mod processor;
pub mod scheduler;
pub mod service;

pub use control::{RunState, SchedulerControl, SchedulerStatus};
pub use processor::{BatchProcessor, BatchSummary};
pub use scheduler::{Scheduler, SchedulerOptions};
pub use service::{MessageService, PageRequest, PaginationInfo, SentMessagesPage};
