use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid URL: {0}")]
    InvalidInput(String),
    #[error("short URL not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}
