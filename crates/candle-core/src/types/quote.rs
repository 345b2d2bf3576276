use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the sentinel entry holding the most recent known price
pub const LATEST_KEY: &str = "latest";

/// Time-of-day key of midnight, which belongs to the end of the previous day
pub const MIDNIGHT_KEY: &str = "000000";

/// Format of time-of-day sample keys
pub const TIME_OF_DAY_FORMAT: &str = "%H%M%S";

/// Raw quote samples of one instrument for one aggregation window
///
/// `quotes` maps `HHMMSS` time-of-day keys to decimal price strings and
/// carries one extra entry under [`LATEST_KEY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentQuotes {
    pub instrument_id: u64,
    pub quotes: BTreeMap<String, String>,
}

impl InstrumentQuotes {
    pub fn new(instrument_id: u64) -> Self {
        Self {
            instrument_id,
            quotes: BTreeMap::new(),
        }
    }

    /// Add a sample (or the latest price when `key` is [`LATEST_KEY`])
    pub fn with(mut self, key: &str, price: &str) -> Self {
        self.quotes.insert(key.to_string(), price.to_string());
        self
    }

    pub fn latest(&self) -> Option<&str> {
        self.quotes.get(LATEST_KEY).map(String::as_str)
    }

    /// Samples excluding the latest sentinel, in key order
    pub fn samples(&self) -> impl Iterator<Item = (&str, &str)> {
        self.quotes
            .iter()
            .filter(|(k, _)| k.as_str() != LATEST_KEY)
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
