use candle_core::types::{IntervalType, MIDNIGHT_KEY, TIME_OF_DAY_FORMAT};
use candle_core::{CandleError, Result};
use chrono::{DateTime, Duration, NaiveTime, Timelike, Utc};

const SECS_PER_DAY: i64 = 86_400;

/// Half-open window `[start, end)` of one aggregation pass
///
/// Samples only carry a time of day, so all comparisons happen in seconds
/// since midnight. A window that wraps past midnight has its upper bound
/// moved forward by one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregationWindow {
    pub interval: IntervalType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl AggregationWindow {
    /// Window of `interval` that closes at the bucket boundary at or before `now`
    pub fn ending_at(interval: IntervalType, now: DateTime<Utc>) -> Result<Self> {
        let secs = match interval.duration_secs() {
            Some(secs) if interval.is_intraday() => secs,
            _ => return Err(CandleError::UnsupportedInterval(interval.to_string())),
        };
        let end = interval.bucket_start(now)?;
        Ok(Self {
            interval,
            start: end - Duration::seconds(secs),
            end,
        })
    }

    pub fn from_time(&self) -> NaiveTime {
        self.start.time()
    }

    pub fn to_time(&self) -> NaiveTime {
        self.end.time()
    }

    pub fn crosses_midnight(&self) -> bool {
        seconds_of_day(self.to_time()) <= seconds_of_day(self.from_time())
    }

    /// `(from, to)` in seconds since midnight, `to` extended past midnight when needed
    pub fn bounds(&self) -> (i64, i64) {
        let from = seconds_of_day(self.from_time());
        let mut to = seconds_of_day(self.to_time());
        if self.crosses_midnight() {
            to += SECS_PER_DAY;
        }
        (from, to)
    }

    /// Run key identifying this window, stable across processes
    pub fn run_key(&self) -> String {
        format!(
            "generate_{}_candle:{}",
            self.interval,
            self.start.format("%Y%m%dT%H%M%S")
        )
    }
}

/// Parse an `HHMMSS` sample key into seconds since midnight
///
/// The midnight key is placed at the end of the day so that it sorts after
/// every sample of the preceding minute.
pub fn sample_offset(key: &str) -> Option<i64> {
    let time = NaiveTime::parse_from_str(key, TIME_OF_DAY_FORMAT).ok()?;
    let secs = seconds_of_day(time);
    if key == MIDNIGHT_KEY {
        Some(secs + SECS_PER_DAY)
    } else {
        Some(secs)
    }
}

fn seconds_of_day(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight())
}
