use crate::models::Mapping;
use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("short code already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("stored data is invalid: {0}")]
    InvalidData(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        let unique_violation = err
            .as_database_error()
            .is_some_and(sqlx::error::DatabaseError::is_unique_violation);

        if unique_violation {
            StorageError::Conflict
        } else {
            StorageError::Other(err.into())
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Durable record store for URL mappings
///
/// Identity assignment and click increments must be atomic in the backend;
/// callers hold no locks of their own.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Initialize the storage (create tables and indexes)
    async fn init(&self) -> Result<()>;

    /// Insert a new record for `original_url` and return it as stored
    ///
    /// The returned mapping carries the identity and timestamp the store
    /// assigned. Its short code is empty until [`Storage::update_code`] is called.
    async fn create(&self, original_url: &str) -> StorageResult<Mapping>;

    /// Attach the derived short code to the record with the given identity
    async fn update_code(&self, id: i64, short_code: &str) -> StorageResult<()>;

    /// Get a mapping by short code
    async fn get_by_code(&self, short_code: &str) -> StorageResult<Option<Mapping>>;

    /// Get the oldest mapping with a short code for the given original URL
    async fn get_by_original_url(&self, original_url: &str) -> StorageResult<Option<Mapping>>;

    /// Increment click count
    async fn increment_clicks(&self, id: i64) -> StorageResult<()>;

    /// List records that were assigned an identity but never received a short code
    async fn list_missing_codes(&self, limit: i64) -> StorageResult<Vec<Mapping>>;
}
