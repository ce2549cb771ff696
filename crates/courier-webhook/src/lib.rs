// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound webhook delivery for Courier.
//!
//! [`DeliveryClient`] stacks two resilience layers: [`HttpTransport`] retries
//! individual HTTP attempts with capped exponential backoff, and an optional
//! [`courier_resilience::CircuitBreaker`] wraps the whole retried call.

pub mod client;
pub mod transport;
pub mod types;

pub use client::{CircuitStatus, DeliveryClient};
pub use transport::{HttpTransport, RetryPolicy};
pub use types::{WebhookRequest, WebhookResponse};
