use crate::models::DbCandle;
use crate::{DatabaseError, Result};
use candle_core::types::{Candle, CandleQuery, Pagination, PaginationInfo};
use candle_core::ConflictPolicy;
use sqlx::{PgExecutor, PgPool, Postgres, QueryBuilder};
use tracing::debug;

const COLUMNS: &str = "id, instrument_id, interval_type, start, open, close, high, low, volume";

/// Count and page must see the same snapshot
const PAGE_SNAPSHOT: &str = "SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY";

const INSERT_PREFIX: &str =
    "INSERT INTO candles (instrument_id, interval_type, start, open, close, high, low, volume) ";

pub struct CandleRepository;

impl CandleRepository {
    /// Insert a batch of candles in one transaction
    ///
    /// Rows are written in INSERT statements of at most `chunk_size` rows.
    /// Returns the number of rows actually written, which is less than
    /// `candles.len()` only under [`ConflictPolicy::Skip`].
    pub async fn insert_batch(
        pool: &PgPool,
        candles: &[Candle],
        chunk_size: usize,
        policy: ConflictPolicy,
    ) -> Result<u64> {
        if candles.is_empty() {
            return Ok(0);
        }

        let rows = candles
            .iter()
            .map(|c| Ok((to_db_id(c.instrument_id)?, c)))
            .collect::<Result<Vec<(i64, &Candle)>>>()?;

        let mut tx = pool.begin().await?;
        let mut written = 0;

        for chunk in rows.chunks(chunk_size.max(1)) {
            let mut builder = Self::insert_builder(chunk, policy);
            let result = builder.build().execute(&mut *tx).await?;
            written += result.rows_affected();
        }

        tx.commit().await?;

        debug!(
            requested = candles.len(),
            written,
            chunk_size,
            "Candle batch committed"
        );
        Ok(written)
    }

    /// First row matching `query`, honouring its ordering and offset
    pub async fn get(pool: &PgPool, query: &CandleQuery) -> Result<Option<Candle>> {
        let mut builder = Self::select_builder(query, query.offset, 1)?;
        let row = builder
            .build_query_as::<DbCandle>()
            .fetch_optional(pool)
            .await?;
        row.map(Candle::try_from).transpose()
    }

    pub async fn list(pool: &PgPool, query: &CandleQuery) -> Result<Vec<Candle>> {
        let mut builder = Self::select_builder(query, query.offset, query.limit)?;
        let rows = builder.build_query_as::<DbCandle>().fetch_all(pool).await?;
        rows.into_iter().map(Candle::try_from).collect()
    }

    /// One page of matches plus the total match count
    ///
    /// The query's own offset and limit are replaced by the page window. Both
    /// statements run in one read-only `REPEATABLE READ` transaction, so the
    /// total agrees with the rows returned.
    pub async fn list_paginated(
        pool: &PgPool,
        query: &CandleQuery,
        pagination: Pagination,
    ) -> Result<(Vec<Candle>, PaginationInfo)> {
        let mut tx = pool.begin().await?;
        sqlx::query(PAGE_SNAPSHOT).execute(&mut *tx).await?;

        let total = Self::count(&mut *tx, query).await?;

        let mut builder = Self::select_builder(query, pagination.offset(), pagination.limit())?;
        let rows = builder
            .build_query_as::<DbCandle>()
            .fetch_all(&mut *tx)
            .await?;
        tx.commit().await?;

        let candles = rows
            .into_iter()
            .map(Candle::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok((candles, pagination.info(total)))
    }

    /// Count rows matching the query's filters
    pub async fn count<'e, E>(executor: E, query: &CandleQuery) -> Result<u64>
    where
        E: PgExecutor<'e>,
    {
        let mut builder = Self::count_builder(query)?;
        let (count,): (i64,) = builder.build_query_as().fetch_one(executor).await?;
        Ok(count.max(0) as u64)
    }

    fn count_builder(query: &CandleQuery) -> Result<QueryBuilder<'static, Postgres>> {
        let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM candles");
        push_filters(&mut builder, query)?;
        Ok(builder)
    }

    fn select_builder(
        query: &CandleQuery,
        offset: u64,
        limit: u64,
    ) -> Result<QueryBuilder<'static, Postgres>> {
        let mut builder = QueryBuilder::new(format!("SELECT {} FROM candles", COLUMNS));
        push_filters(&mut builder, query)?;
        push_order(&mut builder, query);
        push_window(&mut builder, offset, limit)?;
        Ok(builder)
    }

    fn insert_builder(rows: &[(i64, &Candle)], policy: ConflictPolicy) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new(INSERT_PREFIX);
        builder.push_values(rows, |mut b, (instrument_id, candle)| {
            b.push_bind(*instrument_id)
                .push_bind(candle.interval.code())
                .push_bind(candle.start)
                .push_bind(candle.open)
                .push_bind(candle.close)
                .push_bind(candle.high)
                .push_bind(candle.low)
                .push_bind(candle.volume);
        });
        if policy == ConflictPolicy::Skip {
            builder.push(" ON CONFLICT (instrument_id, interval_type, start) DO NOTHING");
        }
        builder
    }
}

fn to_db_id(id: u64) -> Result<i64> {
    i64::try_from(id)
        .map_err(|_| DatabaseError::Serialization(format!("instrument id {} out of range", id)))
}

fn to_db_count(value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::Serialization(format!("{} out of range", value)))
}

/// Append WHERE/AND for the next predicate
fn push_condition(builder: &mut QueryBuilder<'static, Postgres>, has_where: &mut bool, condition: &str) {
    builder.push(if *has_where { " AND " } else { " WHERE " });
    builder.push(condition);
    *has_where = true;
}

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, query: &CandleQuery) -> Result<()> {
    let mut has_where = false;

    if let Some(id) = query.instrument_id {
        push_condition(builder, &mut has_where, "instrument_id = ");
        builder.push_bind(to_db_id(id)?);
    }
    if !query.instrument_ids.is_empty() {
        let ids = query
            .instrument_ids
            .iter()
            .map(|id| to_db_id(*id))
            .collect::<Result<Vec<i64>>>()?;
        push_condition(builder, &mut has_where, "instrument_id = ANY(");
        builder.push_bind(ids);
        builder.push(")");
    }
    if let Some(interval) = query.interval {
        push_condition(builder, &mut has_where, "interval_type = ");
        builder.push_bind(interval.code());
    }
    if let Some(start) = query.start {
        push_condition(builder, &mut has_where, "start = ");
        builder.push_bind(start);
    }
    if let Some(from) = query.start_from {
        push_condition(builder, &mut has_where, "start >= ");
        builder.push_bind(from);
    }
    if let Some(to) = query.start_to {
        push_condition(builder, &mut has_where, "start <= ");
        builder.push_bind(to);
    }
    Ok(())
}

/// Directives in the given order, then `id` so ties keep insertion order
fn push_order(builder: &mut QueryBuilder<'static, Postgres>, query: &CandleQuery) {
    builder.push(" ORDER BY ");
    for order in &query.order_by {
        builder.push(order.column.column_name());
        builder.push(" ");
        builder.push(order.direction.keyword());
        builder.push(", ");
    }
    builder.push("id ASC");
}

fn push_window(builder: &mut QueryBuilder<'static, Postgres>, offset: u64, limit: u64) -> Result<()> {
    if limit > 0 {
        builder.push(" LIMIT ");
        builder.push_bind(to_db_count(limit)?);
    }
    if offset > 0 {
        builder.push(" OFFSET ");
        builder.push_bind(to_db_count(offset)?);
    }
    Ok(())
}
