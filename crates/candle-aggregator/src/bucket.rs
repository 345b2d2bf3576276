use crate::window::AggregationWindow;
use candle_core::types::Candle;
use rust_decimal::Decimal;

/// Running OHLC state of one instrument within one window
///
/// Seeded from the latest known price, which stays the open/close fallback
/// until an in-window sample replaces it. `from`/`to` are the window bounds
/// in seconds since midnight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OhlcBucket {
    from: i64,
    to: i64,
    open: Decimal,
    /// Time of the sample currently used as open; `None` while on the fallback
    open_at: Option<i64>,
    close: Decimal,
    close_at: Option<i64>,
    high: Decimal,
    low: Decimal,
    samples: usize,
}

impl OhlcBucket {
    pub fn seeded(latest: Decimal, (from, to): (i64, i64)) -> Self {
        Self {
            from,
            to,
            open: latest,
            open_at: None,
            close: latest,
            close_at: None,
            high: latest,
            low: latest,
            samples: 0,
        }
    }

    /// Fold one sample taken `at` seconds after midnight
    pub fn observe(&mut self, at: i64, price: Decimal) {
        self.high = self.high.max(price);
        self.low = self.low.min(price);
        self.samples += 1;

        // earliest sample after `from`
        if at > self.from && at < self.to && self.open_at.map_or(true, |t| at < t) {
            self.open = price;
            self.open_at = Some(at);
        }

        // latest sample not after `to`
        if at > self.from && at <= self.to && self.close_at.map_or(true, |t| at > t) {
            self.close = price;
            self.close_at = Some(at);
        }
    }

    /// Samples folded so far, the latest seed excluded
    pub fn samples(&self) -> usize {
        self.samples
    }

    pub fn into_candle(self, instrument_id: u64, window: &AggregationWindow) -> Candle {
        Candle {
            instrument_id,
            interval: window.interval,
            start: window.start,
            open: self.open,
            close: self.close,
            high: self.high,
            low: self.low,
            volume: Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FROM: i64 = 9 * 3600 + 29 * 60;
    const TO: i64 = FROM + 60;

    #[test]
    fn test_seed_only() {
        let bucket = OhlcBucket::seeded(dec!(100), (FROM, TO));
        assert_eq!(bucket.open, dec!(100));
        assert_eq!(bucket.close, dec!(100));
        assert_eq!(bucket.high, dec!(100));
        assert_eq!(bucket.low, dec!(100));
        assert_eq!(bucket.samples(), 0);
    }

    #[test]
    fn test_order_independent_selection() {
        let mut forward = OhlcBucket::seeded(dec!(100), (FROM, TO));
        forward.observe(FROM + 5, dec!(99.5));
        forward.observe(FROM + 30, dec!(101));

        let mut backward = OhlcBucket::seeded(dec!(100), (FROM, TO));
        backward.observe(FROM + 30, dec!(101));
        backward.observe(FROM + 5, dec!(99.5));

        assert_eq!(forward, backward);
        assert_eq!(forward.open, dec!(99.5));
        assert_eq!(forward.close, dec!(101));
        assert_eq!(forward.high, dec!(101));
        assert_eq!(forward.low, dec!(99.5));
    }

    #[test]
    fn test_boundary_samples() {
        let mut bucket = OhlcBucket::seeded(dec!(100), (FROM, TO));
        // at `from`: excluded from open and close, still counts for high/low
        bucket.observe(FROM, dec!(90));
        assert_eq!(bucket.open, dec!(100));
        assert_eq!(bucket.close, dec!(100));
        assert_eq!(bucket.low, dec!(90));

        // at `to`: may close, never opens
        bucket.observe(TO, dec!(105));
        assert_eq!(bucket.open, dec!(100));
        assert_eq!(bucket.close, dec!(105));
        assert_eq!(bucket.high, dec!(105));
    }

    #[test]
    fn test_out_of_window_sample_only_moves_extremes() {
        let mut bucket = OhlcBucket::seeded(dec!(100), (FROM, TO));
        bucket.observe(TO + 10, dec!(120));
        assert_eq!(bucket.open, dec!(100));
        assert_eq!(bucket.close, dec!(100));
        assert_eq!(bucket.high, dec!(120));
    }
}
