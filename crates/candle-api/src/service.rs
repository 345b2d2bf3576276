use candle_core::types::{
    Candle, CandleQuery, IntervalType, OrderBy, Pagination, PaginationInfo,
};
use candle_core::{CandleError, CandleStore, InstrumentDirectory, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{error, info};

/// Manually supplied candles of one instrument and interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandleChart {
    pub instrument_id: u64,
    pub interval: IntervalType,
    pub sticks: Vec<CandleStick>,
}

/// One candle as submitted: unix-second start and decimal strings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandleStick {
    pub start: i64,
    pub open: String,
    pub close: String,
    pub high: String,
    pub low: String,
    /// Empty means zero
    pub volume: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GetCandlesRequest {
    /// Empty means every instrument
    pub instrument_ids: Vec<u64>,
    pub interval: Option<IntervalType>,
    /// Inclusive bounds on the interval start
    pub start_from: Option<DateTime<Utc>>,
    pub start_to: Option<DateTime<Utc>>,
    pub order_by: Vec<OrderBy>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandlePage {
    pub candles: Vec<Candle>,
    pub pagination: PaginationInfo,
}

/// Consumer-facing candle operations shared by every transport
pub struct CandleService {
    store: Arc<dyn CandleStore>,
    directory: Arc<dyn InstrumentDirectory>,
    max_page_size: u32,
}

impl CandleService {
    pub fn new(
        store: Arc<dyn CandleStore>,
        directory: Arc<dyn InstrumentDirectory>,
        max_page_size: u32,
    ) -> Self {
        Self {
            store,
            directory,
            max_page_size: max_page_size.max(1),
        }
    }

    /// Validate and persist manually supplied candles in one batch
    ///
    /// Every referenced instrument must be known to the directory; otherwise
    /// nothing is written. Returns the number of rows written.
    pub async fn create_candles(&self, charts: Vec<CandleChart>) -> Result<usize> {
        let instrument_ids: BTreeSet<u64> = charts.iter().map(|c| c.instrument_id).collect();

        let unknown = self.directory.find_unknown(&instrument_ids).await?;
        if !unknown.is_empty() {
            let unknown: Vec<u64> = unknown.into_iter().collect();
            error!(unknown = ?unknown, "Refusing candles for unknown instruments");
            return Err(CandleError::NoSuchInstrument(unknown));
        }

        let mut candles = Vec::new();
        for chart in &charts {
            for stick in &chart.sticks {
                candles.push(parse_stick(chart.instrument_id, chart.interval, stick)?);
            }
        }

        if candles.is_empty() {
            return Ok(0);
        }

        let written = self.store.insert_batch(&candles).await?;
        candle_metrics::counters::candles_created(written as u64);
        info!(
            instruments = instrument_ids.len(),
            submitted = candles.len(),
            written,
            "Manual candles stored"
        );
        Ok(written)
    }

    /// One page of candles matching the request
    pub async fn get_candles(&self, request: GetCandlesRequest) -> Result<CandlePage> {
        let mut query = CandleQuery::new()
            .instruments(request.instrument_ids)
            .start_between(request.start_from, request.start_to);
        query.interval = request.interval;
        query.order_by = request.order_by;

        let pagination = Pagination::new(
            request.pagination.page,
            request.pagination.page_size().min(self.max_page_size),
        );

        let (candles, pagination) = self.store.list_paginated(&query, pagination).await?;
        Ok(CandlePage {
            candles,
            pagination,
        })
    }

    /// Single candle by its natural key
    pub async fn get_candle(
        &self,
        instrument_id: u64,
        interval: IntervalType,
        start: DateTime<Utc>,
    ) -> Result<Option<Candle>> {
        self.store
            .get(&CandleQuery::by_key(instrument_id, interval, start))
            .await
    }
}

fn parse_stick(instrument_id: u64, interval: IntervalType, stick: &CandleStick) -> Result<Candle> {
    let start = DateTime::from_timestamp(stick.start, 0).ok_or_else(|| {
        CandleError::InvalidInput(format!("start {} is out of range", stick.start))
    })?;

    let candle = Candle {
        instrument_id,
        interval,
        start,
        open: parse_price("open", &stick.open)?,
        close: parse_price("close", &stick.close)?,
        high: parse_price("high", &stick.high)?,
        low: parse_price("low", &stick.low)?,
        volume: if stick.volume.trim().is_empty() {
            Decimal::ZERO
        } else {
            parse_price("volume", &stick.volume)?
        },
    };

    if !candle.is_consistent() {
        return Err(CandleError::InvalidInput(format!(
            "instrument {} at {}: prices must satisfy low <= open, close <= high",
            instrument_id, start
        )));
    }
    Ok(candle)
}

fn parse_price(field: &str, raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|_| CandleError::InvalidInput(format!("{} is not a decimal: {:?}", field, raw)))
}
