use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A shortened URL as persisted by the durable store
///
/// `short_code` is empty for a record whose identity was assigned but whose
/// code has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Mapping {
    pub id: i64,
    pub short_code: String,
    pub original_url: String,
    pub created_at: i64,
    pub click_count: i64,
}

impl Mapping {
    pub fn has_code(&self) -> bool {
        !self.short_code.is_empty()
    }
}

#[derive(Debug, Deserialize)]
pub struct ShortenRequest {
    /// A missing field is treated like a blank one
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
}
