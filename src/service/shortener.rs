use std::sync::Arc;
use tracing::{debug, info, warn};
use url::Url;

use crate::encoding;
use crate::models::Mapping;
use crate::service::ServiceError;
use crate::storage::{Storage, StorageError};

/// What to do when the same original URL is shortened twice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DuplicatePolicy {
    /// Mint a fresh record and code on every call
    #[default]
    AlwaysCreate,
    /// Return the oldest existing mapping for the URL when there is one
    ReuseExisting,
}

/// Validates URLs, persists new mappings and derives their short codes.
///
/// Persisting is two separate store calls: the insert assigns the identity,
/// then the code derived from it is written back. There is no transaction
/// around the pair, so a failure in between leaves a record without a code.
/// Such records are never resolvable and are repaired by
/// [`ShorteningService::reconcile_missing_codes`].
///
/// The cache is not touched here; it fills lazily on first resolution.
pub struct ShorteningService {
    storage: Arc<dyn Storage>,
    duplicate_policy: DuplicatePolicy,
}

impl ShorteningService {
    pub fn new(storage: Arc<dyn Storage>, duplicate_policy: DuplicatePolicy) -> Self {
        Self {
            storage,
            duplicate_policy,
        }
    }

    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        self.duplicate_policy
    }

    /// Shorten a URL and return the stored mapping
    pub async fn shorten(&self, raw_url: &str) -> Result<Mapping, ServiceError> {
        let original_url = validate_url(raw_url)?;

        if self.duplicate_policy == DuplicatePolicy::ReuseExisting {
            if let Some(existing) = self.storage.get_by_original_url(original_url).await? {
                debug!(short_code = %existing.short_code, "Reusing existing mapping");
                return Ok(existing);
            }
        }

        let created = self.storage.create(original_url).await?;
        let short_code = code_for(created.id)?;
        self.storage.update_code(created.id, &short_code).await?;

        info!(id = created.id, short_code = %short_code, "Created short URL");

        Ok(Mapping {
            short_code,
            ..created
        })
    }

    /// Derive and write codes for records left without one
    ///
    /// Returns how many records were repaired. Records that fail are logged
    /// and left for the next pass.
    pub async fn reconcile_missing_codes(&self, limit: i64) -> Result<usize, ServiceError> {
        let pending = self.storage.list_missing_codes(limit).await?;
        let mut repaired = 0;

        for mapping in pending {
            let short_code = code_for(mapping.id)?;
            match self.storage.update_code(mapping.id, &short_code).await {
                Ok(()) => {
                    info!(id = mapping.id, short_code = %short_code, "Repaired missing short code");
                    repaired += 1;
                }
                Err(err) => {
                    warn!(id = mapping.id, error = %err, "Failed to repair missing short code");
                }
            }
        }

        Ok(repaired)
    }
}

/// Trim the input and require an absolute URL with a host
///
/// Scheme defaulting is left to the caller.
fn validate_url(raw_url: &str) -> Result<&str, ServiceError> {
    let trimmed = raw_url.trim();

    if trimmed.is_empty() {
        return Err(ServiceError::InvalidInput("URL cannot be empty".to_string()));
    }

    let parsed = Url::parse(trimmed).map_err(|e| ServiceError::InvalidInput(e.to_string()))?;

    match parsed.host_str() {
        Some(host) if !host.is_empty() => Ok(trimmed),
        _ => Err(ServiceError::InvalidInput(format!(
            "URL must have a host: {trimmed}"
        ))),
    }
}

fn code_for(id: i64) -> Result<String, ServiceError> {
    let id = u64::try_from(id).map_err(|_| {
        StorageError::InvalidData(format!("store assigned a negative identity: {id}"))
    })?;
    Ok(encoding::encode(id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_trims_whitespace() {
        assert_eq!(
            validate_url("  https://example.com/path \n").unwrap(),
            "https://example.com/path"
        );
    }

    #[test]
    fn test_validate_rejects_blank_input() {
        assert!(matches!(validate_url(""), Err(ServiceError::InvalidInput(_))));
        assert!(matches!(validate_url("   "), Err(ServiceError::InvalidInput(_))));
    }

    #[test]
    fn test_validate_rejects_urls_without_host() {
        for input in ["not a url, no host", "example.com/path", "mailto:someone@example.com", "https://"] {
            assert!(
                matches!(validate_url(input), Err(ServiceError::InvalidInput(_))),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_accepts_any_scheme_with_host() {
        assert!(validate_url("http://example.com").is_ok());
        assert!(validate_url("ftp://files.example.com/a.txt").is_ok());
        assert!(validate_url("https://127.0.0.1:8080/x?y=z").is_ok());
    }

    #[test]
    fn test_code_for_rejects_negative_identity() {
        assert!(matches!(code_for(-1), Err(ServiceError::Storage(_))));
        assert_eq!(code_for(62).unwrap(), "10");
    }
}
