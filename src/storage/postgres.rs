use crate::models::Mapping;
use crate::storage::{Storage, StorageError, StorageResult};
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

pub struct PostgresStorage {
    pool: Arc<PgPool>,
}

impl PostgresStorage {
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self {
            pool: Arc::new(pool),
        })
    }
}

#[async_trait]
impl Storage for PostgresStorage {
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS urls (
                id BIGSERIAL PRIMARY KEY,
                original_url TEXT NOT NULL,
                short_code TEXT UNIQUE,
                created_at BIGINT NOT NULL,
                click_count BIGINT NOT NULL DEFAULT 0
            )
            "#,
        )
        .execute(self.pool.as_ref())
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_urls_original_url ON urls(original_url)")
            .execute(self.pool.as_ref())
            .await?;

        Ok(())
    }

    async fn create(&self, original_url: &str) -> StorageResult<Mapping> {
        let created_at = chrono::Utc::now().timestamp();

        let mapping = sqlx::query_as::<_, Mapping>(
            r#"
            INSERT INTO urls (original_url, created_at)
            VALUES ($1, $2)
            RETURNING id, '' AS short_code, original_url, created_at, click_count
            "#,
        )
        .bind(original_url)
        .bind(created_at)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn update_code(&self, id: i64, short_code: &str) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE urls
            SET short_code = $1
            WHERE id = $2
            "#,
        )
        .bind(short_code)
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn get_by_code(&self, short_code: &str) -> StorageResult<Option<Mapping>> {
        let mapping = sqlx::query_as::<_, Mapping>(
            r#"
            SELECT id, short_code, original_url, created_at, click_count
            FROM urls
            WHERE short_code = $1
            "#,
        )
        .bind(short_code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn get_by_original_url(&self, original_url: &str) -> StorageResult<Option<Mapping>> {
        let mapping = sqlx::query_as::<_, Mapping>(
            r#"
            SELECT id, short_code, original_url, created_at, click_count
            FROM urls
            WHERE original_url = $1 AND short_code IS NOT NULL
            ORDER BY id
            LIMIT 1
            "#,
        )
        .bind(original_url)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(mapping)
    }

    async fn increment_clicks(&self, id: i64) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE urls
            SET click_count = click_count + 1
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn list_missing_codes(&self, limit: i64) -> StorageResult<Vec<Mapping>> {
        let mappings = sqlx::query_as::<_, Mapping>(
            r#"
            SELECT id, '' AS short_code, original_url, created_at, click_count
            FROM urls
            WHERE short_code IS NULL
            ORDER BY id
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(mappings)
    }
}
