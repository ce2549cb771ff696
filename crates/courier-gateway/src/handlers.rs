// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the REST API.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use serde_json::{Value, json};

use courier_core::{CourierError, Message, NewMessage};
use courier_dispatch::{PageRequest, SchedulerStatus, SentMessagesPage};
use courier_webhook::CircuitStatus;

use crate::response::{ApiError, ApiResponse};
use crate::server::GatewayState;

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "courier" }))
}

/// POST /api/v1/messages
pub async fn create_message(
    State(state): State<GatewayState>,
    body: Result<Json<NewMessage>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), ApiError> {
    let Json(request) =
        body.map_err(|e| CourierError::Validation(format!("invalid request body: {}", e.body_text())))?;
    let message = state.messages.create(request).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Message created successfully", message)),
    ))
}

/// GET /api/v1/messages/sent?page&limit
pub async fn sent_messages(
    State(state): State<GatewayState>,
    query: Result<Query<PageRequest>, QueryRejection>,
) -> Result<Json<ApiResponse<SentMessagesPage>>, ApiError> {
    let Query(request) =
        query.map_err(|e| CourierError::Validation(format!("invalid query: {}", e.body_text())))?;
    let page = state.messages.sent_messages(request).await?;
    Ok(Json(ApiResponse::ok("Sent messages retrieved successfully", page)))
}

/// POST /api/v1/scheduler/start
pub async fn start_scheduler(
    State(state): State<GatewayState>,
) -> Result<Json<ApiResponse<SchedulerStatus>>, ApiError> {
    let status = state.control.start().await?;
    Ok(Json(ApiResponse::ok(status.message.clone(), status)))
}

/// POST /api/v1/scheduler/stop
pub async fn stop_scheduler(
    State(state): State<GatewayState>,
) -> Result<Json<ApiResponse<SchedulerStatus>>, ApiError> {
    let status = state.control.stop().await?;
    Ok(Json(ApiResponse::ok(status.message.clone(), status)))
}

/// GET /api/v1/scheduler/status
pub async fn scheduler_status(State(state): State<GatewayState>) -> Json<ApiResponse<SchedulerStatus>> {
    let status = state.control.status();
    Json(ApiResponse::ok(status.message.clone(), status))
}

/// GET /api/v1/circuit-breaker/status
pub async fn circuit_status(State(state): State<GatewayState>) -> Json<ApiResponse<CircuitStatus>> {
    Json(ApiResponse::ok(
        "Circuit breaker status retrieved successfully",
        state.delivery.circuit_metrics(),
    ))
}
