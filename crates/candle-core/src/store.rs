use crate::error::Result;
use crate::types::{Candle, CandleQuery, Pagination, PaginationInfo};
use async_trait::async_trait;

/// Persistent candle storage
///
/// Implementations must make `insert_batch` atomic: either every row of the
/// batch becomes visible to readers or none does.
#[async_trait]
pub trait CandleStore: Send + Sync {
    /// Persist a batch in one transaction, returning the number of rows written
    async fn insert_batch(&self, candles: &[Candle]) -> Result<usize>;

    /// First row matching `query`, or `None` when nothing matches
    async fn get(&self, query: &CandleQuery) -> Result<Option<Candle>>;

    /// All rows matching `query`, honouring its ordering, offset and limit
    async fn list(&self, query: &CandleQuery) -> Result<Vec<Candle>>;

    /// One page of rows matching `query` plus the total match count
    ///
    /// The page replaces any offset/limit carried by `query`.
    async fn list_paginated(
        &self,
        query: &CandleQuery,
        pagination: Pagination,
    ) -> Result<(Vec<Candle>, PaginationInfo)>;
}
