// src/agent/executor.rs
use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;

/// Runs an already-guarded query and returns each row as a JSON object.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    async fn run(&self, sql: &str) -> Result<Vec<Value>, sqlx::Error>;
}

pub struct PgQueryRunner {
    pool: PgPool,
    statement_timeout_ms: u64,
    row_limit: u32,
}

impl PgQueryRunner {
    pub fn new(pool: PgPool, statement_timeout_ms: u64, row_limit: u32) -> Self {
        Self {
            pool,
            statement_timeout_ms,
            row_limit,
        }
    }
}

#[async_trait]
impl QueryRunner for PgQueryRunner {
    async fn run(&self, sql: &str) -> Result<Vec<Value>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;
        sqlx::query(&format!("SET LOCAL statement_timeout = {}", self.statement_timeout_ms))
            .execute(&mut *tx)
            .await?;

        let wrapped = format!(
            "SELECT row_to_json(t) FROM ({}) t LIMIT {}",
            sql, self.row_limit
        );
        let rows = sqlx::query_scalar::<_, Value>(&wrapped)
            .fetch_all(&mut *tx)
            .await;

        // Nothing here ever commits
        if let Err(e) = tx.rollback().await {
            tracing::warn!("Failed to roll back search transaction: {}", e);
        }

        match &rows {
            Ok(found) => tracing::debug!("Search query returned {} rows", found.len()),
            Err(e) => tracing::info!("Search query failed: {}", e),
        }
        rows
    }
}
