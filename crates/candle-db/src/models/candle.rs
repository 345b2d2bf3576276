use crate::DatabaseError;
use candle_core::types::{Candle, IntervalType};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `candles` table
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DbCandle {
    /// Surrogate key, follows insertion order
    pub id: i64,
    pub instrument_id: i64,
    /// Persisted [`IntervalType`] code
    pub interval_type: i32,
    pub start: DateTime<Utc>,
    pub open: Decimal,
    pub close: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub volume: Decimal,
}

impl TryFrom<DbCandle> for Candle {
    type Error = DatabaseError;

    fn try_from(row: DbCandle) -> Result<Self, Self::Error> {
        let interval = IntervalType::from_code(row.interval_type).ok_or_else(|| {
            DatabaseError::Serialization(format!(
                "row {} has unknown interval code {}",
                row.id, row.interval_type
            ))
        })?;
        let instrument_id = u64::try_from(row.instrument_id).map_err(|_| {
            DatabaseError::Serialization(format!(
                "row {} has negative instrument id {}",
                row.id, row.instrument_id
            ))
        })?;

        Ok(Candle {
            instrument_id,
            interval,
            start: row.start,
            open: row.open,
            close: row.close,
            high: row.high,
            low: row.low,
            volume: row.volume,
        })
    }
}
