use async_trait::async_trait;
use candle_core::types::{Candle, CandleKey, CandleQuery, Pagination, PaginationInfo};
use candle_core::{CandleError, CandleStore, ConflictPolicy, Result};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Default)]
struct CandleTable {
    /// Rows in insertion order
    rows: Vec<Candle>,
    keys: HashSet<CandleKey>,
}

impl CandleTable {
    fn select(&self, query: &CandleQuery) -> Vec<Candle> {
        let mut rows: Vec<Candle> = self
            .rows
            .iter()
            .filter(|c| query.matches(c))
            .cloned()
            .collect();
        // stable sort keeps insertion order among equal keys
        if !query.order_by.is_empty() {
            rows.sort_by(|a, b| query.compare(a, b));
        }
        rows
    }
}

/// Thread-safe in-memory candle table
///
/// Same contract as the PostgreSQL store; used when no database is configured
/// and in tests.
#[derive(Debug, Default)]
pub struct MemoryCandleStore {
    table: RwLock<CandleTable>,
    conflict_policy: ConflictPolicy,
}

impl MemoryCandleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_conflict_policy(conflict_policy: ConflictPolicy) -> Self {
        Self {
            table: RwLock::new(CandleTable::default()),
            conflict_policy,
        }
    }

    /// Total stored rows
    pub fn count(&self) -> usize {
        self.table.read().rows.len()
    }
}

fn window(rows: Vec<Candle>, offset: u64, limit: u64) -> Vec<Candle> {
    let rows = rows.into_iter().skip(offset as usize);
    if limit > 0 {
        rows.take(limit as usize).collect()
    } else {
        rows.collect()
    }
}

#[async_trait]
impl CandleStore for MemoryCandleStore {
    async fn insert_batch(&self, candles: &[Candle]) -> Result<usize> {
        let start = Instant::now();
        let mut table = self.table.write();

        // validate the whole batch before touching the table
        let mut batch_keys = HashSet::with_capacity(candles.len());
        let mut accepted = Vec::with_capacity(candles.len());
        for candle in candles {
            let key = candle.key();
            if table.keys.contains(&key) || batch_keys.contains(&key) {
                match self.conflict_policy {
                    ConflictPolicy::Fail => {
                        return Err(CandleError::Storage(format!(
                            "duplicate candle: instrument={} interval={} start={}",
                            key.instrument_id, key.interval, key.start
                        )));
                    }
                    ConflictPolicy::Skip => continue,
                }
            }
            batch_keys.insert(key);
            accepted.push(candle.clone());
        }

        let written = accepted.len();
        table.keys.extend(batch_keys);
        table.rows.extend(accepted);

        debug!(
            requested = candles.len(),
            written,
            total = table.rows.len(),
            insert_us = start.elapsed().as_micros() as u64,
            "Candle batch stored in memory"
        );
        Ok(written)
    }

    async fn get(&self, query: &CandleQuery) -> Result<Option<Candle>> {
        let table = self.table.read();
        Ok(table.select(query).into_iter().nth(query.offset as usize))
    }

    async fn list(&self, query: &CandleQuery) -> Result<Vec<Candle>> {
        let rows = self.table.read().select(query);
        Ok(window(rows, query.offset, query.limit))
    }

    async fn list_paginated(
        &self,
        query: &CandleQuery,
        pagination: Pagination,
    ) -> Result<(Vec<Candle>, PaginationInfo)> {
        let rows = self.table.read().select(query);
        let info = pagination.info(rows.len() as u64);
        Ok((window(rows, pagination.offset(), pagination.limit()), info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::types::{IntervalType, OrderBy, OrderColumn};
    use chrono::{DateTime, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 9, minute, 0).unwrap()
    }

    fn candle(instrument_id: u64, minute: u32) -> Candle {
        let base = Decimal::from(instrument_id * 100 + u64::from(minute));
        Candle {
            instrument_id,
            interval: IntervalType::Minute1,
            start: at(minute),
            open: base,
            close: base + dec!(1),
            high: base + dec!(2),
            low: base - dec!(1),
            volume: Decimal::ZERO,
        }
    }

    fn sample() -> Vec<Candle> {
        let mut rows = Vec::new();
        for minute in [3, 1, 4, 11, 5] {
            for id in [5, 7, 9] {
                rows.push(candle(id, minute));
            }
        }
        rows
    }

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryCandleStore::new();
        let rows = sample();
        assert_eq!(store.insert_batch(&rows).await.unwrap(), rows.len());

        let (page, info) = store
            .list_paginated(&CandleQuery::new(), Pagination::new(1, 100))
            .await
            .unwrap();
        assert_eq!(page, rows);
        assert_eq!(info.total_count, rows.len() as u64);
        assert_eq!(info.total_pages, 1);
    }

    #[tokio::test]
    async fn test_duplicate_fails_whole_batch() {
        let store = MemoryCandleStore::new();
        store.insert_batch(&[candle(1, 0)]).await.unwrap();

        let err = store
            .insert_batch(&[candle(2, 0), candle(1, 0)])
            .await
            .unwrap_err();
        assert!(matches!(err, CandleError::Storage(_)));
        assert_eq!(store.count(), 1);

        // duplicate inside one batch
        assert!(store.insert_batch(&[candle(3, 0), candle(3, 0)]).await.is_err());
        assert_eq!(store.count(), 1);
    }

    #[tokio::test]
    async fn test_skip_policy_counts_new_rows_only() {
        let store = MemoryCandleStore::with_conflict_policy(ConflictPolicy::Skip);
        store.insert_batch(&[candle(1, 0)]).await.unwrap();

        let written = store
            .insert_batch(&[candle(1, 0), candle(2, 0), candle(2, 0)])
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.count(), 2);
    }

    #[tokio::test]
    async fn test_filter_composition() {
        let store = MemoryCandleStore::new();
        store.insert_batch(&sample()).await.unwrap();

        let query = CandleQuery::new()
            .instruments([5, 9])
            .start_between(Some(at(3)), Some(at(5)));
        let rows = store.list(&query).await.unwrap();

        assert_eq!(rows.len(), 6);
        assert!(rows
            .iter()
            .all(|c| [5, 9].contains(&c.instrument_id) && c.start >= at(3) && c.start <= at(5)));
    }

    #[tokio::test]
    async fn test_ordering_and_window() {
        let store = MemoryCandleStore::new();
        store.insert_batch(&sample()).await.unwrap();

        let query = CandleQuery::new()
            .instrument(7)
            .order(OrderBy::desc(OrderColumn::Start));
        let rows = store.list(&query).await.unwrap();
        assert_eq!(rows.len(), 5);
        assert!(rows.windows(2).all(|w| w[0].start >= w[1].start));

        let rows = store.list(&query.clone().offset(1).limit(2)).await.unwrap();
        let minutes: Vec<DateTime<Utc>> = rows.iter().map(|c| c.start).collect();
        assert_eq!(minutes, vec![at(5), at(4)]);
    }

    #[tokio::test]
    async fn test_get_by_key_and_not_found() {
        let store = MemoryCandleStore::new();
        store.insert_batch(&sample()).await.unwrap();

        let found = store
            .get(&CandleQuery::by_key(9, IntervalType::Minute1, at(4)))
            .await
            .unwrap();
        assert_eq!(found, Some(candle(9, 4)));

        let missing = store
            .get(&CandleQuery::by_key(9, IntervalType::Hour1, at(4)))
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_pagination_totals_ignore_slice() {
        let store = MemoryCandleStore::new();
        store.insert_batch(&sample()).await.unwrap();

        let query = CandleQuery::new()
            .order(OrderBy::asc(OrderColumn::Start))
            .order(OrderBy::asc(OrderColumn::InstrumentId));
        let (rows, info) = store
            .list_paginated(&query, Pagination::new(2, 4))
            .await
            .unwrap();

        assert_eq!(info.total_count, 15);
        assert_eq!(info.total_pages, 4);
        assert_eq!(info.offset, 4);
        assert_eq!(rows.len(), 4);
        assert_eq!((rows[0].instrument_id, rows[0].start), (7, at(3)));
    }
}
