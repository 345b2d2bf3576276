mod candle;
mod query;
mod quote;

pub use candle::{Candle, CandleKey, IntervalType};
pub use query::{CandleQuery, OrderBy, OrderColumn, OrderDirection, Pagination, PaginationInfo};
pub use quote::{InstrumentQuotes, LATEST_KEY, MIDNIGHT_KEY, TIME_OF_DAY_FORMAT};
