use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::storage::{Storage, StorageResult};

/// Fire-and-forget click counting
///
/// Every call spawns a detached task and returns immediately. The task has its
/// own timeout and is not tied to the request that triggered it, so a client
/// disconnect does not cancel a click that already resolved. Failures are
/// logged and dropped: click counts are approximate, with no retry and no
/// queue.
#[derive(Clone)]
pub struct ClickAccountant {
    storage: Arc<dyn Storage>,
    timeout: Duration,
}

impl ClickAccountant {
    pub fn new(storage: Arc<dyn Storage>, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    /// Count a click for a mapping whose identity is already known
    pub fn record(&self, id: i64) {
        let storage = Arc::clone(&self.storage);
        let timeout = self.timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, storage.increment_clicks(id)).await {
                Ok(Ok(())) => debug!(id, "Click counted"),
                Ok(Err(err)) => warn!(id, error = %err, "Failed to count click, dropping it"),
                Err(_) => warn!(id, "Click increment timed out, dropping it"),
            }
        });
    }

    /// Count a click when only the short code is known
    ///
    /// The cache holds the URL alone, so the identity is looked up from the
    /// durable store first.
    pub fn record_by_code(&self, short_code: &str) {
        let storage = Arc::clone(&self.storage);
        let timeout = self.timeout;
        let short_code = short_code.to_string();

        tokio::spawn(async move {
            let outcome =
                tokio::time::timeout(timeout, increment_by_code(storage.as_ref(), &short_code))
                    .await;

            match outcome {
                Ok(Ok(true)) => debug!(short_code = %short_code, "Click counted"),
                Ok(Ok(false)) => {
                    debug!(short_code = %short_code, "No durable record for cached code, dropping click")
                }
                Ok(Err(err)) => {
                    warn!(short_code = %short_code, error = %err, "Failed to count click, dropping it")
                }
                Err(_) => warn!(short_code = %short_code, "Click increment timed out, dropping it"),
            }
        });
    }
}

/// Returns `false` when the code has no durable record
async fn increment_by_code(storage: &dyn Storage, short_code: &str) -> StorageResult<bool> {
    match storage.get_by_code(short_code).await? {
        Some(mapping) => {
            storage.increment_clicks(mapping.id).await?;
            Ok(true)
        }
        None => Ok(false),
    }
}
