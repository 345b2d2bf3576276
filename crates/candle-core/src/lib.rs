pub mod config;
pub mod error;
pub mod store;
pub mod types;
pub mod upstream;

pub use config::{AggregationConfig, ConflictPolicy, MissingLatestPolicy};
pub use error::{CandleError, Result};
pub use store::CandleStore;
pub use upstream::{InstrumentDirectory, QuoteSource};
