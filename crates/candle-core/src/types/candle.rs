use crate::error::{CandleError, Result};
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Candle granularity
///
/// The numeric codes are the persisted representation and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IntervalType {
    Minute1,
    Minute2,
    Minute5,
    Minute10,
    Minute15,
    Minute30,
    Hour1,
    Day1,
    Day5,
    Week1,
    Month1,
    Year1,
}

impl IntervalType {
    /// Persisted code for this interval
    pub const fn code(&self) -> i32 {
        match self {
            IntervalType::Minute1 => 21,
            IntervalType::Minute2 => 22,
            IntervalType::Minute5 => 25,
            IntervalType::Minute10 => 210,
            IntervalType::Minute15 => 215,
            IntervalType::Minute30 => 230,
            IntervalType::Hour1 => 31,
            IntervalType::Day1 => 41,
            IntervalType::Day5 => 45,
            IntervalType::Week1 => 51,
            IntervalType::Month1 => 61,
            IntervalType::Year1 => 71,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::all().iter().copied().find(|i| i.code() == code)
    }

    /// Fixed duration in seconds; `None` for calendar intervals
    pub const fn duration_secs(&self) -> Option<i64> {
        match self {
            IntervalType::Minute1 => Some(60),
            IntervalType::Minute2 => Some(120),
            IntervalType::Minute5 => Some(300),
            IntervalType::Minute10 => Some(600),
            IntervalType::Minute15 => Some(900),
            IntervalType::Minute30 => Some(1800),
            IntervalType::Hour1 => Some(3600),
            IntervalType::Day1 => Some(86_400),
            IntervalType::Day5 => Some(432_000),
            IntervalType::Week1 => Some(604_800),
            IntervalType::Month1 | IntervalType::Year1 => None,
        }
    }

    /// Whether a window of this interval fits inside one wall-clock day
    pub fn is_intraday(&self) -> bool {
        matches!(self.duration_secs(), Some(secs) if secs <= 86_400)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            IntervalType::Minute1 => "1m",
            IntervalType::Minute2 => "2m",
            IntervalType::Minute5 => "5m",
            IntervalType::Minute10 => "10m",
            IntervalType::Minute15 => "15m",
            IntervalType::Minute30 => "30m",
            IntervalType::Hour1 => "1h",
            IntervalType::Day1 => "1d",
            IntervalType::Day5 => "5d",
            IntervalType::Week1 => "1w",
            IntervalType::Month1 => "1M",
            IntervalType::Year1 => "1y",
        }
    }

    pub const fn all() -> &'static [IntervalType] {
        &[
            IntervalType::Minute1,
            IntervalType::Minute2,
            IntervalType::Minute5,
            IntervalType::Minute10,
            IntervalType::Minute15,
            IntervalType::Minute30,
            IntervalType::Hour1,
            IntervalType::Day1,
            IntervalType::Day5,
            IntervalType::Week1,
            IntervalType::Month1,
            IntervalType::Year1,
        ]
    }

    /// Start of the fixed-duration bucket containing `timestamp`
    pub fn bucket_start(&self, timestamp: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let duration = self
            .duration_secs()
            .ok_or_else(|| CandleError::UnsupportedInterval(self.to_string()))?;
        let secs = timestamp.timestamp().div_euclid(duration) * duration;
        Utc.timestamp_opt(secs, 0)
            .single()
            .ok_or_else(|| CandleError::InvalidInput(format!("timestamp out of range: {}", secs)))
    }
}

impl fmt::Display for IntervalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for IntervalType {
    type Err = CandleError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "1m" | "1MI" | "MINUTE_1" => Ok(IntervalType::Minute1),
            "2m" | "2MI" | "MINUTE_2" => Ok(IntervalType::Minute2),
            "5m" | "5MI" | "MINUTE_5" => Ok(IntervalType::Minute5),
            "10m" | "10MI" | "MINUTE_10" => Ok(IntervalType::Minute10),
            "15m" | "15MI" | "MINUTE_15" => Ok(IntervalType::Minute15),
            "30m" | "30MI" | "MINUTE_30" => Ok(IntervalType::Minute30),
            "1h" | "1HR" | "HOUR_1" => Ok(IntervalType::Hour1),
            "1d" | "1DY" | "DAY_1" => Ok(IntervalType::Day1),
            "5d" | "5DY" | "DAY_5" => Ok(IntervalType::Day5),
            "1w" | "1WK" | "WEEK_1" => Ok(IntervalType::Week1),
            "1M" | "1MO" | "MONTH_1" => Ok(IntervalType::Month1),
            "1y" | "1YR" | "YEAR_1" => Ok(IntervalType::Year1),
            other => Err(CandleError::InvalidInput(format!("unknown interval: {}", other))),
        }
    }
}

/// Natural key of a candle row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CandleKey {
    pub instrument_id: u64,
    pub interval: IntervalType,
    pub start: DateTime<Utc>,
}

/// One OHLCV aggregate for an instrument over an interval
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candle {
    pub instrument_id: u64,
    pub interval: IntervalType,
    /// Interval start, truncated to the interval boundary
    pub start: DateTime<Utc>,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    /// Always zero for candles built from quote samples
    pub volume: Decimal,
}

impl Candle {
    pub fn key(&self) -> CandleKey {
        CandleKey {
            instrument_id: self.instrument_id,
            interval: self.interval,
            start: self.start,
        }
    }

    /// Check `low <= open, close <= high`
    pub fn is_consistent(&self) -> bool {
        self.low <= self.high
            && self.low <= self.open
            && self.low <= self.close
            && self.open <= self.high
            && self.close <= self.high
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_codes_round_trip() {
        for interval in IntervalType::all() {
            assert_eq!(IntervalType::from_code(interval.code()), Some(*interval));
        }
        assert_eq!(IntervalType::from_code(0), None);
        assert_eq!(IntervalType::Minute10.code(), 210);
    }

    #[test]
    fn test_intraday() {
        assert!(IntervalType::Minute1.is_intraday());
        assert!(IntervalType::Day1.is_intraday());
        assert!(!IntervalType::Day5.is_intraday());
        assert!(!IntervalType::Month1.is_intraday());
    }

    #[test]
    fn test_bucket_start() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 9, 29, 42).unwrap();
        assert_eq!(
            IntervalType::Minute1.bucket_start(ts).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 29, 0).unwrap()
        );
        assert_eq!(
            IntervalType::Minute15.bucket_start(ts).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 15, 0).unwrap()
        );
        assert!(IntervalType::Year1.bucket_start(ts).is_err());
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!("1m".parse::<IntervalType>().unwrap(), IntervalType::Minute1);
        assert_eq!("1MI".parse::<IntervalType>().unwrap(), IntervalType::Minute1);
        assert_eq!("HOUR_1".parse::<IntervalType>().unwrap(), IntervalType::Hour1);
        assert!("7m".parse::<IntervalType>().is_err());
    }

    #[test]
    fn test_consistency() {
        let mut candle = Candle {
            instrument_id: 1,
            interval: IntervalType::Minute1,
            start: Utc.with_ymd_and_hms(2024, 3, 1, 9, 29, 0).unwrap(),
            open: dec!(10),
            close: dec!(11),
            high: dec!(12),
            low: dec!(9),
            volume: Decimal::ZERO,
        };
        assert!(candle.is_consistent());

        candle.high = dec!(10.5);
        assert!(!candle.is_consistent());
    }
}
