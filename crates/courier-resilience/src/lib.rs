// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resilience primitives for Courier.
//!
//! Currently a single [`CircuitBreaker`] shared by the webhook delivery client.

pub mod circuit_breaker;

pub use circuit_breaker::{
    CircuitBreaker, CircuitBreakerConfig, CircuitError, CircuitMetrics, CircuitState,
};
