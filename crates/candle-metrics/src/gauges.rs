use metrics::{describe_gauge, gauge};

/// Initialize gauge descriptions
pub fn init() {
    describe_gauge!(
        "candle_active_instruments",
        "Instruments returned by the directory on the last pass"
    );
    describe_gauge!(
        "candle_last_interval_start",
        "Unix start of the last interval aggregated successfully"
    );
}

pub fn set_active_instruments(count: usize) {
    gauge!("candle_active_instruments").set(count as f64);
}

pub fn set_last_interval_start(unix_secs: i64) {
    gauge!("candle_last_interval_start").set(unix_secs as f64);
}
