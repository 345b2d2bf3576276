use crate::{config::DatabaseConfig, DatabaseError, Result};
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Shared PostgreSQL pool for the candle store
#[derive(Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Pool settings derived from the configuration, without connecting
    pub fn options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_secs)))
    }

    /// Open the pool and wait for the first connection
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        info!(
            max_connections = config.max_connections,
            conflict_policy = ?config.conflict_policy,
            insert_chunk_size = config.insert_chunk_size,
            "Connecting to candle database"
        );

        let pool = Self::options(config)
            .connect(&config.url)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Apply pending schema migrations for the candles table
    pub async fn migrate(&self) -> Result<()> {
        let started = Instant::now();
        sqlx::migrate!("./src/migrations").run(&self.pool).await?;
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Candle migrations applied"
        );
        Ok(())
    }

    pub fn inner(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip latency of a trivial query
    pub async fn ping(&self) -> Result<Duration> {
        let started = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Connection(e.to_string()))?;
        Ok(started.elapsed())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
