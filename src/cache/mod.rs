//! Cache store used by the resolution read path
//!
//! The cache only ever holds `short code -> original URL` pairs with a
//! store-managed expiry. Callers treat every error as a miss.

pub mod memory;
pub mod null;
pub mod redis;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

pub use self::memory::MemoryCache;
pub use self::null::NullCache;
pub use self::redis::RedisCache;

#[derive(Debug, Clone, Error)]
pub enum CacheError {
    #[error("cache backend unavailable: {0}")]
    Unavailable(String),
    #[error("cache operation timed out: {0}")]
    Timeout(String),
    #[error("cache operation failed: {0}")]
    Operation(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

#[async_trait]
pub trait UrlCache: Send + Sync {
    /// Look up a value; `Ok(None)` is a miss
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Store a value that the cache expires on its own after `ttl`
    async fn set_with_expiry(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;
}
