use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

use super::{CacheError, CacheResult, UrlCache};

/// A Redis-backed cache
///
/// Keys are namespaced with a configurable prefix. Every command runs under
/// `op_timeout` so a slow Redis degrades to a miss instead of stalling the
/// request.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
    key_prefix: String,
    op_timeout: Duration,
}

/// Whole seconds for `SETEX`, rounded up so an entry never expires early
///
/// `SETEX` rejects a zero expiry, so the result is at least one.
fn expiry_secs(ttl: Duration) -> u64 {
    (ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0)).max(1)
}

fn map_redis_error(operation: &str, err: redis::RedisError) -> CacheError {
    let message = format!("{operation}: {err}");
    if err.is_timeout() {
        CacheError::Timeout(message)
    } else if err.is_io_error() {
        CacheError::Unavailable(message)
    } else {
        CacheError::Operation(message)
    }
}

impl RedisCache {
    /// Connect to Redis and verify the connection with `PING`
    pub async fn connect(
        redis_url: &str,
        key_prefix: impl Into<String>,
        op_timeout: Duration,
    ) -> CacheResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| map_redis_error("invalid Redis URL", e))?;

        let conn = tokio::time::timeout(op_timeout, ConnectionManager::new(client))
            .await
            .map_err(|_| CacheError::Timeout("connecting to Redis".to_string()))?
            .map_err(|e| map_redis_error("failed to connect to Redis", e))?;

        let cache = Self {
            conn,
            key_prefix: key_prefix.into(),
            op_timeout,
        };
        cache.ping().await?;
        info!("Connected to Redis cache");

        Ok(cache)
    }

    pub async fn ping(&self) -> CacheResult<()> {
        let mut conn = self.conn.clone();
        self.with_timeout("PING", async move {
            redis::cmd("PING").query_async::<String>(&mut conn).await
        })
        .await
        .map(|_| ())
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}{}", self.key_prefix, key)
    }

    async fn with_timeout<T, F>(&self, operation: &str, fut: F) -> CacheResult<T>
    where
        F: Future<Output = redis::RedisResult<T>>,
    {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(|e| map_redis_error(operation, e)),
            Err(_) => Err(CacheError::Timeout(format!(
                "{operation}: no reply within {}ms",
                self.op_timeout.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl UrlCache for RedisCache {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let cache_key = self.cache_key(key);
        let mut conn = self.conn.clone();

        let value = self
            .with_timeout("GET", async move {
                conn.get::<_, Option<String>>(&cache_key).await
            })
            .await
            .inspect_err(|e| warn!(key, error = %e, "Redis error on get"))?;

        match value {
            Some(_) => debug!(key, "Cache hit in Redis"),
            None => trace!(key, "Cache miss in Redis"),
        }

        Ok(value)
    }

    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let cache_key = self.cache_key(key);
        let value = value.to_string();
        let seconds = expiry_secs(ttl);
        let mut conn = self.conn.clone();

        self.with_timeout("SETEX", async move {
            conn.set_ex::<_, _, ()>(&cache_key, value, seconds).await
        })
        .await
        .inspect_err(|e| warn!(key, error = %e, "Failed to cache value in Redis"))?;

        debug!(key, ttl_secs = seconds, "Cached value in Redis");
        Ok(())
    }
}
