pub mod aggregator;
pub mod bucket;
pub mod job;
pub mod scheduler;
pub mod window;

pub use aggregator::{AggregationOutput, CandleAggregator};
pub use bucket::OhlcBucket;
pub use job::{CandleJob, JobReport};
pub use scheduler::{CandleScheduler, TickOutcome};
pub use window::AggregationWindow;
