// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for Courier.
//!
//! Exposes message intake, sent-message queries, scheduler control and the
//! circuit breaker status over a JSON REST API. Every `/api/v1` response
//! uses the `{status, msg, data}` envelope from [`response`].

pub mod handlers;
pub mod response;
pub mod server;

pub use response::{ApiError, ApiResponse};
pub use server::{GatewayState, build_router, start_server};
