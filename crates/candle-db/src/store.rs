use crate::repositories::CandleRepository;
use crate::{DatabaseConfig, DatabasePool};
use async_trait::async_trait;
use candle_core::types::{Candle, CandleQuery, Pagination, PaginationInfo};
use candle_core::{CandleStore, ConflictPolicy, Result};
use std::sync::Arc;
use tracing::warn;

/// [`CandleStore`] backed by the PostgreSQL `candles` table
#[derive(Clone)]
pub struct PgCandleStore {
    pool: Arc<DatabasePool>,
    insert_chunk_size: usize,
    conflict_policy: ConflictPolicy,
}

impl PgCandleStore {
    pub fn new(pool: Arc<DatabasePool>, config: &DatabaseConfig) -> Self {
        Self {
            pool,
            insert_chunk_size: config.insert_chunk_size,
            conflict_policy: config.conflict_policy,
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

#[async_trait]
impl CandleStore for PgCandleStore {
    async fn insert_batch(&self, candles: &[Candle]) -> Result<usize> {
        let written = CandleRepository::insert_batch(
            self.pool.inner(),
            candles,
            self.insert_chunk_size,
            self.conflict_policy,
        )
        .await
        .inspect_err(|e| warn!(error = %e, rows = candles.len(), "Candle batch rolled back"))?;
        Ok(written as usize)
    }

    async fn get(&self, query: &CandleQuery) -> Result<Option<Candle>> {
        Ok(CandleRepository::get(self.pool.inner(), query).await?)
    }

    async fn list(&self, query: &CandleQuery) -> Result<Vec<Candle>> {
        Ok(CandleRepository::list(self.pool.inner(), query).await?)
    }

    async fn list_paginated(
        &self,
        query: &CandleQuery,
        pagination: Pagination,
    ) -> Result<(Vec<Candle>, PaginationInfo)> {
        Ok(CandleRepository::list_paginated(self.pool.inner(), query, pagination).await?)
    }
}
