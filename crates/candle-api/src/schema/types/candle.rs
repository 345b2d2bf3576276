use crate::service::{CandleChart, CandleStick};
use async_graphql::{Enum, InputObject, SimpleObject};
use candle_core::types::{Candle, IntervalType, OrderBy, OrderColumn, OrderDirection};
use chrono::{DateTime, Utc};

/// GraphQL candle interval enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[graphql(name = "CandleInterval")]
pub enum GqlInterval {
    #[graphql(name = "MINUTE_1")]
    Minute1,
    #[graphql(name = "MINUTE_2")]
    Minute2,
    #[graphql(name = "MINUTE_5")]
    Minute5,
    #[graphql(name = "MINUTE_10")]
    Minute10,
    #[graphql(name = "MINUTE_15")]
    Minute15,
    #[graphql(name = "MINUTE_30")]
    Minute30,
    #[graphql(name = "HOUR_1")]
    Hour1,
    #[graphql(name = "DAY_1")]
    Day1,
    #[graphql(name = "DAY_5")]
    Day5,
    #[graphql(name = "WEEK_1")]
    Week1,
    #[graphql(name = "MONTH_1")]
    Month1,
    #[graphql(name = "YEAR_1")]
    Year1,
}

impl From<GqlInterval> for IntervalType {
    fn from(interval: GqlInterval) -> Self {
        match interval {
            GqlInterval::Minute1 => IntervalType::Minute1,
            GqlInterval::Minute2 => IntervalType::Minute2,
            GqlInterval::Minute5 => IntervalType::Minute5,
            GqlInterval::Minute10 => IntervalType::Minute10,
            GqlInterval::Minute15 => IntervalType::Minute15,
            GqlInterval::Minute30 => IntervalType::Minute30,
            GqlInterval::Hour1 => IntervalType::Hour1,
            GqlInterval::Day1 => IntervalType::Day1,
            GqlInterval::Day5 => IntervalType::Day5,
            GqlInterval::Week1 => IntervalType::Week1,
            GqlInterval::Month1 => IntervalType::Month1,
            GqlInterval::Year1 => IntervalType::Year1,
        }
    }
}

impl From<IntervalType> for GqlInterval {
    fn from(interval: IntervalType) -> Self {
        match interval {
            IntervalType::Minute1 => GqlInterval::Minute1,
            IntervalType::Minute2 => GqlInterval::Minute2,
            IntervalType::Minute5 => GqlInterval::Minute5,
            IntervalType::Minute10 => GqlInterval::Minute10,
            IntervalType::Minute15 => GqlInterval::Minute15,
            IntervalType::Minute30 => GqlInterval::Minute30,
            IntervalType::Hour1 => GqlInterval::Hour1,
            IntervalType::Day1 => GqlInterval::Day1,
            IntervalType::Day5 => GqlInterval::Day5,
            IntervalType::Week1 => GqlInterval::Week1,
            IntervalType::Month1 => GqlInterval::Month1,
            IntervalType::Year1 => GqlInterval::Year1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[graphql(name = "CandleOrderColumn")]
pub enum GqlOrderColumn {
    Start,
    InstrumentId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum)]
#[graphql(name = "OrderDirection")]
pub enum GqlOrderDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, InputObject)]
#[graphql(name = "CandleOrderBy")]
pub struct GqlOrderBy {
    pub column: GqlOrderColumn,
    #[graphql(default_with = "GqlOrderDirection::Asc")]
    pub direction: GqlOrderDirection,
}

impl From<GqlOrderBy> for OrderBy {
    fn from(order: GqlOrderBy) -> Self {
        OrderBy {
            column: match order.column {
                GqlOrderColumn::Start => OrderColumn::Start,
                GqlOrderColumn::InstrumentId => OrderColumn::InstrumentId,
            },
            direction: match order.direction {
                GqlOrderDirection::Asc => OrderDirection::Asc,
                GqlOrderDirection::Desc => OrderDirection::Desc,
            },
        }
    }
}

/// GraphQL candle type; prices are decimal strings
#[derive(Debug, Clone, SimpleObject)]
#[graphql(name = "Candle")]
pub struct GqlCandle {
    pub instrument_id: u64,
    pub interval: GqlInterval,
    /// Interval start as unix seconds
    pub start: i64,
    pub start_time: DateTime<Utc>,
    pub open: String,
    pub close: String,
    pub high: String,
    pub low: String,
    pub volume: String,
}

impl From<Candle> for GqlCandle {
    fn from(candle: Candle) -> Self {
        Self {
            instrument_id: candle.instrument_id,
            interval: candle.interval.into(),
            start: candle.start.timestamp(),
            start_time: candle.start,
            open: candle.open.to_string(),
            close: candle.close.to_string(),
            high: candle.high.to_string(),
            low: candle.low.to_string(),
            volume: candle.volume.to_string(),
        }
    }
}

#[derive(Debug, Clone, InputObject)]
#[graphql(name = "CandleStickInput")]
pub struct CandleStickInput {
    /// Interval start as unix seconds
    pub start: i64,
    pub open: String,
    pub close: String,
    pub high: String,
    pub low: String,
    #[graphql(default)]
    pub volume: String,
}

#[derive(Debug, Clone, InputObject)]
#[graphql(name = "CandleChartInput")]
pub struct CandleChartInput {
    pub instrument_id: u64,
    pub interval: GqlInterval,
    pub sticks: Vec<CandleStickInput>,
}

impl From<CandleChartInput> for CandleChart {
    fn from(input: CandleChartInput) -> Self {
        Self {
            instrument_id: input.instrument_id,
            interval: input.interval.into(),
            sticks: input
                .sticks
                .into_iter()
                .map(|s| CandleStick {
                    start: s.start,
                    open: s.open,
                    close: s.close,
                    high: s.high,
                    low: s.low,
                    volume: s.volume,
                })
                .collect(),
        }
    }
}
