// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! [`MessageCache`] over a multiplexed Redis connection.

use std::time::Duration;

use async_trait::async_trait;
use courier_config::model::CacheConfig;
use courier_core::{CacheEntry, CourierError, MessageCache, cache_key};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use tracing::{debug, info};
use uuid::Uuid;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Receipt cache backed by Redis `SET key value EX ttl`.
pub struct RedisCache {
    conn: MultiplexedConnection,
    ttl_secs: u64,
}

impl RedisCache {
    /// Connects and pings the server, failing if it is unreachable within 5s.
    pub async fn connect(config: &CacheConfig) -> Result<Self, CourierError> {
        let client = Client::open(config.url()).map_err(|e| cache_err("invalid redis url", e))?;

        let mut conn = tokio::time::timeout(CONNECT_TIMEOUT, client.get_multiplexed_async_connection())
            .await
            .map_err(|_| CourierError::Cache {
                message: format!("timed out connecting to redis at {}:{}", config.host, config.port),
                source: None,
            })?
            .map_err(|e| cache_err("failed to connect to redis", e))?;

        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(|e| cache_err("redis ping failed", e))?;

        info!(host = %config.host, port = config.port, db = config.db, "redis cache connected");
        Ok(Self {
            conn,
            ttl_secs: config.ttl_secs,
        })
    }
}

#[async_trait]
impl MessageCache for RedisCache {
    async fn set(&self, id: Uuid, entry: &CacheEntry) -> Result<(), CourierError> {
        let payload = encode_entry(entry)?;
        let mut conn = self.conn.clone();
        let () = conn
            .set_ex(cache_key(&id), payload, self.ttl_secs)
            .await
            .map_err(|e| cache_err("failed to set cache entry", e))?;
        debug!(%id, "cache entry set");
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<CacheEntry>, CourierError> {
        let mut conn = self.conn.clone();
        let raw: Option<String> = conn
            .get(cache_key(&id))
            .await
            .map_err(|e| cache_err("failed to get cache entry", e))?;
        raw.as_deref().map(decode_entry).transpose()
    }
}

fn encode_entry(entry: &CacheEntry) -> Result<String, CourierError> {
    serde_json::to_string(entry).map_err(|e| cache_err("failed to encode cache entry", e))
}

fn decode_entry(raw: &str) -> Result<CacheEntry, CourierError> {
    serde_json::from_str(raw).map_err(|e| cache_err("failed to decode cache entry", e))
}

fn cache_err<E>(message: &str, err: E) -> CourierError
where
    E: std::error::Error + Send + Sync + 'static,
{
    CourierError::Cache {
        message: format!("{message}: {err}"),
        source: Some(Box::new(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn entry_json_shape() {
        let entry = CacheEntry {
            message_id: "ext-42".into(),
            sent_at: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
        };
        let json = encode_entry(&entry).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["message_id"], "ext-42");
        assert_eq!(decode_entry(&json).unwrap(), entry);
    }

    #[test]
    fn garbage_payload_is_cache_error() {
        let err = decode_entry("not json").unwrap_err();
        assert_eq!(err.code(), "CACHE_ERROR");
    }

    #[tokio::test]
    async fn unreachable_server_fails_to_connect() {
        let config = CacheConfig {
            enabled: true,
            host: "127.0.0.1".into(),
            port: 1,
            ..CacheConfig::default()
        };
        let err = RedisCache::connect(&config).await.err().unwrap();
        assert!(matches!(err, CourierError::Cache { .. }));
    }
}
