use metrics::{counter, describe_counter};

/// Initialize counter descriptions
pub fn init() {
    describe_counter!(
        "candle_aggregation_runs_total",
        "Aggregation passes by outcome"
    );
    describe_counter!(
        "candle_candles_generated_total",
        "Candles produced by scheduled aggregation"
    );
    describe_counter!(
        "candle_candles_created_total",
        "Candles written through the create API"
    );
    describe_counter!(
        "candle_samples_skipped_total",
        "Quote samples dropped because their time or price did not parse"
    );
    describe_counter!(
        "candle_instruments_skipped_total",
        "Instruments left out of a pass for missing quotes or latest price"
    );
    describe_counter!("candle_errors_total", "Errors by type");
}

/// Count one aggregation pass (`outcome` is "ok", "failed" or "skipped")
pub fn aggregation_run(outcome: &'static str) {
    counter!("candle_aggregation_runs_total", "outcome" => outcome).increment(1);
}

pub fn candles_generated(count: u64) {
    counter!("candle_candles_generated_total").increment(count);
}

pub fn candles_created(count: u64) {
    counter!("candle_candles_created_total").increment(count);
}

pub fn samples_skipped(count: u64) {
    counter!("candle_samples_skipped_total").increment(count);
}

pub fn instruments_skipped(count: u64) {
    counter!("candle_instruments_skipped_total").increment(count);
}

pub fn errors(count: u64, error_type: &str) {
    counter!("candle_errors_total", "type" => error_type.to_string()).increment(count);
}
