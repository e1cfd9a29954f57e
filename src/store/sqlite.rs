// src/store/sqlite.rs

use std::time::Duration;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::{error::AppError, store::RecordStore};

/// Buckets stored as rows of a single `buckets(name, content)` table.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        // An in-memory database lives only as long as its connection.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Self::from_pool(pool).await
    }

    /// Runs the embedded migrations on an existing pool.
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Bucket table ready");
        Ok(Self { pool })
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn load(&self, bucket: &str) -> Result<Option<String>, AppError> {
        let content = sqlx::query_scalar::<_, String>("SELECT content FROM buckets WHERE name = ?")
            .bind(bucket)
            .fetch_optional(&self.pool)
            .await?;
        Ok(content)
    }

    async fn save(&self, bucket: &str, content: String) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO buckets (name, content, updated_at)
            VALUES (?, ?, CURRENT_TIMESTAMP)
            ON CONFLICT(name) DO UPDATE SET
                content = excluded.content,
                updated_at = CURRENT_TIMESTAMP
            "#,
        )
        .bind(bucket)
        .bind(content)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, bucket: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM buckets WHERE name = ?")
            .bind(bucket)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
