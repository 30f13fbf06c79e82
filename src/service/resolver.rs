use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace, warn};

use crate::cache::UrlCache;
use crate::service::{ClickAccountant, ServiceError};
use crate::storage::Storage;

/// Default expiry of cached resolutions
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolves short codes with a cache-aside read path.
///
/// The cache is consulted first, but a miss is never taken as proof that the
/// code does not exist: it always falls through to the durable store, and only
/// a durable read ever populates the cache. Concurrent misses for the same
/// code each read the store and each overwrite the cache entry; the overwrite
/// is idempotent, so nothing coalesces them.
pub struct ResolutionService {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn UrlCache>,
    clicks: ClickAccountant,
    cache_ttl: Duration,
}

impl ResolutionService {
    pub fn new(
        storage: Arc<dyn Storage>,
        cache: Arc<dyn UrlCache>,
        clicks: ClickAccountant,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            storage,
            cache,
            clicks,
            cache_ttl,
        }
    }

    /// Resolve a short code to its original URL
    ///
    /// Only ever fails with [`ServiceError::NotFound`]. A durable store that
    /// cannot be reached is reported the same way as a code that does not
    /// exist, and cache failures degrade to the durable path.
    pub async fn resolve(&self, short_code: &str) -> Result<String, ServiceError> {
        if short_code.is_empty() {
            return Err(ServiceError::NotFound);
        }

        match self.cache.get(short_code).await {
            Ok(Some(original_url)) => {
                trace!(short_code = %short_code, "Resolved from cache");
                // The cached value carries no identity, so the accountant looks it up
                self.clicks.record_by_code(short_code);
                return Ok(original_url);
            }
            Ok(None) => {
                trace!(short_code = %short_code, "Cache miss");
            }
            Err(err) => {
                warn!(short_code = %short_code, error = %err, "Cache lookup failed, falling back to storage");
            }
        }

        let mapping = match self.storage.get_by_code(short_code).await {
            Ok(Some(mapping)) => mapping,
            Ok(None) => {
                debug!(short_code = %short_code, "Short code not found");
                return Err(ServiceError::NotFound);
            }
            Err(err) => {
                warn!(short_code = %short_code, error = %err, "Storage lookup failed");
                return Err(ServiceError::NotFound);
            }
        };

        if let Err(err) = self
            .cache
            .set_with_expiry(short_code, &mapping.original_url, self.cache_ttl)
            .await
        {
            warn!(short_code = %short_code, error = %err, "Failed to populate cache");
        }

        self.clicks.record(mapping.id);

        debug!(short_code = %short_code, "Resolved from storage");
        Ok(mapping.original_url)
    }
}
