use super::gql_error;
use super::types::{GqlCandle, GqlCandlePage, GqlInterval, GqlOrderBy};
use crate::service::{CandleService, GetCandlesRequest};
use async_graphql::{Context, Object, Result};
use candle_core::types::Pagination;
use candle_core::CandleError;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Root query type
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Page of candles; every filter is optional and filters combine with AND
    #[allow(clippy::too_many_arguments)]
    async fn candles(
        &self,
        ctx: &Context<'_>,
        instrument_ids: Option<Vec<u64>>,
        interval: Option<GqlInterval>,
        start_from: Option<i64>,
        start_to: Option<i64>,
        order_by: Option<Vec<GqlOrderBy>>,
        #[graphql(default = 1)] page: u32,
        #[graphql(default = 100)] page_size: u32,
    ) -> Result<GqlCandlePage> {
        let service = ctx.data::<Arc<CandleService>>()?;
        let request = GetCandlesRequest {
            instrument_ids: instrument_ids.unwrap_or_default(),
            interval: interval.map(Into::into),
            start_from: start_from.map(unix_time).transpose().map_err(gql_error)?,
            start_to: start_to.map(unix_time).transpose().map_err(gql_error)?,
            order_by: order_by
                .unwrap_or_default()
                .into_iter()
                .map(Into::into)
                .collect(),
            pagination: Pagination::new(page, page_size),
        };

        let page = service.get_candles(request).await.map_err(gql_error)?;
        Ok(page.into())
    }

    /// Single candle by instrument, interval and start (unix seconds)
    async fn candle(
        &self,
        ctx: &Context<'_>,
        instrument_id: u64,
        interval: GqlInterval,
        start: i64,
    ) -> Result<Option<GqlCandle>> {
        let service = ctx.data::<Arc<CandleService>>()?;
        let start = unix_time(start).map_err(gql_error)?;
        let candle = service
            .get_candle(instrument_id, interval.into(), start)
            .await
            .map_err(gql_error)?;
        Ok(candle.map(GqlCandle::from))
    }

    /// Health check
    async fn health(&self) -> Result<bool> {
        Ok(true)
    }
}

fn unix_time(secs: i64) -> candle_core::Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CandleError::InvalidInput(format!("timestamp {} is out of range", secs)))
}
