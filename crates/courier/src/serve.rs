// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `courier serve`: wires storage, cache, delivery, scheduler and gateway.

use std::sync::Arc;

use courier_cache::RedisCache;
use courier_config::CourierConfig;
use courier_config::model::{CacheConfig, LoggingConfig};
use courier_core::{CourierError, MessageCache, NoopCache};
use courier_dispatch::{BatchProcessor, MessageService, Scheduler, SchedulerControl, SchedulerOptions};
use courier_gateway::{GatewayState, start_server};
use courier_storage::SqliteMessageStore;
use courier_webhook::DeliveryClient;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::shutdown;

/// Initializes the global tracing subscriber.
///
/// `RUST_LOG` wins over the configured level when set.
pub fn init_tracing(logging: &LoggingConfig) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("courier={},warn", logging.level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false);

    if logging.format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Runs the service until SIGINT/SIGTERM or a gateway failure.
pub async fn run_serve(config: CourierConfig) -> Result<(), CourierError> {
    info!(version = env!("CARGO_PKG_VERSION"), "starting courier");

    let store = Arc::new(SqliteMessageStore::open(&config.storage).await?);
    let cache = connect_cache(&config.cache).await;
    let delivery = Arc::new(DeliveryClient::new(&config.webhook, &config.circuit_breaker)?);

    let processor = Arc::new(BatchProcessor::new(store.clone(), delivery.clone(), cache));
    let scheduler = Arc::new(Scheduler::new(SchedulerOptions::from_config(&config.scheduler)));
    scheduler.set_processor(processor);

    let state = GatewayState {
        messages: Arc::new(MessageService::new(store)),
        control: Arc::new(SchedulerControl::new(scheduler.clone())),
        delivery,
    };

    let cancel = shutdown::install_signal_handler();
    let server_shutdown = CancellationToken::new();
    let server_config = config.server.clone();
    let server_token = server_shutdown.clone();
    let mut server =
        tokio::spawn(async move { start_server(&server_config, state, server_token).await });

    if config.scheduler.auto_start {
        if let Err(e) = scheduler.start().await {
            error!(error = %e, "failed to auto-start scheduler");
        }
    }

    let early_exit = tokio::select! {
        _ = cancel.cancelled() => None,
        res = &mut server => Some(res),
    };

    scheduler.stop().await?;

    let server_result = match early_exit {
        Some(res) => res,
        None => {
            server_shutdown.cancel();
            server.await
        }
    };

    match server_result {
        Ok(result) => result?,
        Err(e) => return Err(CourierError::Internal(format!("gateway task failed: {e}"))),
    }

    info!("courier shut down cleanly");
    Ok(())
}

async fn connect_cache(config: &CacheConfig) -> Arc<dyn MessageCache> {
    if !config.enabled {
        info!("receipt cache disabled");
        return Arc::new(NoopCache);
    }
    match RedisCache::connect(config).await {
        Ok(cache) => Arc::new(cache),
        Err(e) => {
            warn!(error = %e, "failed to connect to redis, continuing without cache");
            Arc::new(NoopCache)
        }
    }
}
