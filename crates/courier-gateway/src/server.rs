// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Router assembly and the listener loop for the REST API.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use courier_config::model::ServerConfig;
use courier_core::CourierError;
use courier_dispatch::{MessageService, SchedulerControl};
use courier_webhook::DeliveryClient;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub messages: Arc<MessageService>,
    pub control: Arc<SchedulerControl>,
    /// Source of circuit breaker status.
    pub delivery: Arc<DeliveryClient>,
}

/// All routes with CORS and request tracing applied.
pub fn build_router(state: GatewayState) -> Router {
    let api = Router::new()
        .route("/messages", post(handlers::create_message))
        .route("/messages/sent", get(handlers::sent_messages))
        .route("/scheduler/start", post(handlers::start_scheduler))
        .route("/scheduler/stop", post(handlers::stop_scheduler))
        .route("/scheduler/status", get(handlers::scheduler_status))
        .route("/circuit-breaker/status", get(handlers::circuit_status));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/api/v1", api)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Binds `host:port` and serves until `shutdown` is cancelled.
///
/// In-flight requests are allowed to finish; each one is bounded by
/// [`ServerConfig::request_timeout`].
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: CancellationToken,
) -> Result<(), CourierError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| CourierError::Internal(format!("cannot listen on {addr}: {e}")))?;
    let local = listener.local_addr().map(|a| a.to_string()).unwrap_or(addr);
    info!(addr = %local, "api listening");

    let app = build_router(state).layer(TimeoutLayer::new(config.request_timeout()));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
        .map_err(|e| CourierError::Internal(format!("api server failed: {e}")))?;

    info!(addr = %local, "api stopped");
    Ok(())
}
