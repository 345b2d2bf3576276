use metrics::{describe_histogram, histogram};
use std::time::Duration;

/// Initialize histogram descriptions
pub fn init() {
    describe_histogram!(
        "candle_aggregation_duration_seconds",
        "Wall time of one aggregation pass, upstream calls included"
    );
    describe_histogram!(
        "candle_db_write_duration_seconds",
        "Time to write one candle batch"
    );
    describe_histogram!(
        "candle_upstream_request_duration_seconds",
        "Time for instrument directory and quote source requests"
    );
}

pub fn aggregation_duration(duration: Duration) {
    histogram!("candle_aggregation_duration_seconds").record(duration.as_secs_f64());
}

pub fn db_write_duration(duration: Duration) {
    histogram!("candle_db_write_duration_seconds").record(duration.as_secs_f64());
}

pub fn upstream_request_duration(duration: Duration, method: &'static str) {
    histogram!("candle_upstream_request_duration_seconds", "method" => method)
        .record(duration.as_secs_f64());
}
