use crate::bucket::OhlcBucket;
use crate::window::{sample_offset, AggregationWindow};
use candle_core::types::{Candle, InstrumentQuotes};
use candle_core::{CandleError, MissingLatestPolicy, Result};
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;
use tracing::{debug, error, warn};

/// Result of aggregating one window
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregationOutput {
    /// One candle per aggregated instrument, in instrument ID order
    pub candles: Vec<Candle>,
    /// Samples dropped because their key or price did not parse
    pub skipped_samples: usize,
    /// Instruments dropped for lacking a usable latest price (skip policy only)
    pub skipped_instruments: Vec<u64>,
    /// Instruments the quote response left out entirely
    pub unquoted_instruments: Vec<u64>,
}

/// Turns per-second quote samples into one candle per instrument
///
/// Pure and synchronous; fetching samples and persisting candles is the
/// caller's business.
#[derive(Debug, Clone, Copy, Default)]
pub struct CandleAggregator {
    policy: MissingLatestPolicy,
}

impl CandleAggregator {
    pub fn new(policy: MissingLatestPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> MissingLatestPolicy {
        self.policy
    }

    /// Aggregate `quotes` for every instrument in `instruments` over `window`
    ///
    /// Quotes for instruments outside `instruments` are ignored, and
    /// instruments absent from `quotes` are skipped whatever the policy. Under
    /// [`MissingLatestPolicy::Abort`] a quote set without a usable latest price
    /// fails the whole window.
    pub fn aggregate(
        &self,
        window: &AggregationWindow,
        instruments: &BTreeSet<u64>,
        quotes: &[InstrumentQuotes],
    ) -> Result<AggregationOutput> {
        let by_instrument: HashMap<u64, &InstrumentQuotes> =
            quotes.iter().map(|q| (q.instrument_id, q)).collect();
        let bounds = window.bounds();
        let mut output = AggregationOutput::default();

        for &instrument_id in instruments {
            let Some(samples) = by_instrument.get(&instrument_id) else {
                warn!(instrument_id, "No quotes returned for instrument, skipping");
                output.unquoted_instruments.push(instrument_id);
                continue;
            };

            let latest = samples
                .latest()
                .and_then(|raw| Decimal::from_str(raw.trim()).ok());

            let Some(latest) = latest else {
                match self.policy {
                    MissingLatestPolicy::Abort => {
                        error!(instrument_id, "Instrument has no latest quote, aborting batch");
                        return Err(CandleError::MissingLatest(instrument_id));
                    }
                    MissingLatestPolicy::Skip => {
                        error!(instrument_id, "Instrument has no latest quote, skipping");
                        output.skipped_instruments.push(instrument_id);
                        continue;
                    }
                }
            };

            let mut bucket = OhlcBucket::seeded(latest, bounds);
            for (key, raw_price) in samples.samples() {
                let Some(at) = sample_offset(key) else {
                    warn!(instrument_id, key, "Unparseable quote time, sample skipped");
                    output.skipped_samples += 1;
                    continue;
                };
                let Ok(price) = Decimal::from_str(raw_price.trim()) else {
                    warn!(instrument_id, key, price = raw_price, "Unparseable quote price, sample skipped");
                    output.skipped_samples += 1;
                    continue;
                };
                bucket.observe(at, price);
            }

            debug!(
                instrument_id,
                samples = bucket.samples(),
                start = %window.start,
                "Aggregated instrument"
            );
            output.candles.push(bucket.into_candle(instrument_id, window));
        }

        let ignored = by_instrument
            .keys()
            .filter(|id| !instruments.contains(id))
            .count();
        if ignored > 0 {
            debug!(ignored, "Quotes returned for instruments outside the batch");
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::types::IntervalType;
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    fn window(h: u32, m: u32) -> AggregationWindow {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, h, m, 0).unwrap();
        AggregationWindow::ending_at(IntervalType::Minute1, now).unwrap()
    }

    fn ids(ids: &[u64]) -> BTreeSet<u64> {
        ids.iter().copied().collect()
    }

    #[test]
    fn test_reference_window() {
        let quotes = vec![InstrumentQuotes::new(1)
            .with("latest", "100.00")
            .with("092930", "101.00")
            .with("092905", "99.50")];

        let out = CandleAggregator::default()
            .aggregate(&window(9, 30), &ids(&[1]), &quotes)
            .unwrap();

        assert_eq!(out.candles.len(), 1);
        let candle = &out.candles[0];
        assert_eq!(candle.open, dec!(99.50));
        assert_eq!(candle.close, dec!(101.00));
        assert_eq!(candle.high, dec!(101.00));
        assert_eq!(candle.low, dec!(99.50));
        assert_eq!(candle.volume, Decimal::ZERO);
        assert_eq!(candle.interval, IntervalType::Minute1);
        assert_eq!(candle.start, Utc.with_ymd_and_hms(2024, 3, 1, 9, 29, 0).unwrap());
    }

    #[test]
    fn test_latest_only_is_flat() {
        let quotes = vec![InstrumentQuotes::new(7).with("latest", "42.5")];
        let out = CandleAggregator::default()
            .aggregate(&window(9, 30), &ids(&[7]), &quotes)
            .unwrap();

        let c = &out.candles[0];
        assert_eq!((c.open, c.close, c.high, c.low), (dec!(42.5), dec!(42.5), dec!(42.5), dec!(42.5)));
    }

    #[test]
    fn test_midnight_sample_is_the_close() {
        let quotes = vec![InstrumentQuotes::new(1)
            .with("latest", "10")
            .with("235930", "11")
            .with("000000", "12")];

        let out = CandleAggregator::default()
            .aggregate(&window(0, 0), &ids(&[1]), &quotes)
            .unwrap();

        let c = &out.candles[0];
        assert_eq!(c.open, dec!(11));
        assert_eq!(c.close, dec!(12));
        assert_eq!(c.high, dec!(12));
        assert_eq!(c.low, dec!(10));
        assert_eq!(c.start, Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 0).unwrap());
    }

    #[test]
    fn test_malformed_samples_are_skipped() {
        let quotes = vec![InstrumentQuotes::new(1)
            .with("latest", "10")
            .with("09:29:10", "50")
            .with("092920", "not-a-price")
            .with("092940", "10.5")];

        let out = CandleAggregator::default()
            .aggregate(&window(9, 30), &ids(&[1]), &quotes)
            .unwrap();

        assert_eq!(out.skipped_samples, 2);
        let c = &out.candles[0];
        assert_eq!(c.open, dec!(10.5));
        assert_eq!(c.close, dec!(10.5));
        assert_eq!(c.high, dec!(10.5));
        assert_eq!(c.low, dec!(10));
    }

    #[test]
    fn test_missing_latest_aborts_batch() {
        let quotes = vec![
            InstrumentQuotes::new(1).with("latest", "10"),
            InstrumentQuotes::new(2).with("092930", "20"),
        ];

        let err = CandleAggregator::new(MissingLatestPolicy::Abort)
            .aggregate(&window(9, 30), &ids(&[1, 2]), &quotes)
            .unwrap_err();
        assert!(matches!(err, CandleError::MissingLatest(2)));
    }

    #[test]
    fn test_missing_latest_skip_policy() {
        let quotes = vec![
            InstrumentQuotes::new(1).with("latest", "10"),
            InstrumentQuotes::new(2).with("092930", "20"),
            InstrumentQuotes::new(3).with("latest", "garbage"),
        ];

        let out = CandleAggregator::new(MissingLatestPolicy::Skip)
            .aggregate(&window(9, 30), &ids(&[1, 2, 3, 4]), &quotes)
            .unwrap();

        assert_eq!(out.candles.len(), 1);
        assert_eq!(out.candles[0].instrument_id, 1);
        assert_eq!(out.skipped_instruments, vec![2, 3]);
        assert_eq!(out.unquoted_instruments, vec![4]);
    }

    #[test]
    fn test_unquoted_instrument_does_not_abort() {
        let quotes = vec![InstrumentQuotes::new(1).with("latest", "10")];

        let out = CandleAggregator::new(MissingLatestPolicy::Abort)
            .aggregate(&window(9, 30), &ids(&[1, 2]), &quotes)
            .unwrap();

        assert_eq!(out.candles.len(), 1);
        assert_eq!(out.candles[0].instrument_id, 1);
        assert_eq!(out.candles[0].close, dec!(10));
        assert_eq!(out.unquoted_instruments, vec![2]);
        assert!(out.skipped_instruments.is_empty());
    }

    #[test]
    fn test_ignores_unrequested_instruments() {
        let quotes = vec![
            InstrumentQuotes::new(1).with("latest", "10"),
            InstrumentQuotes::new(99).with("latest", "10"),
        ];
        let out = CandleAggregator::default()
            .aggregate(&window(9, 30), &ids(&[1]), &quotes)
            .unwrap();
        assert_eq!(out.candles.len(), 1);
    }

    #[test]
    fn test_idempotent_and_consistent() {
        let quotes: Vec<InstrumentQuotes> = (1..=20u64)
            .map(|id| {
                let mut q = InstrumentQuotes::new(id).with("latest", &format!("{}.25", 100 + id));
                for s in (0..60).step_by(7) {
                    let price = format!("{}.{}", 95 + (id * 7 + s) % 11, s);
                    q = q.with(&format!("0929{:02}", s), &price);
                }
                q
            })
            .collect();
        let instruments: BTreeSet<u64> = (1..=20).collect();
        let aggregator = CandleAggregator::default();

        let first = aggregator.aggregate(&window(9, 30), &instruments, &quotes).unwrap();
        let second = aggregator.aggregate(&window(9, 30), &instruments, &quotes).unwrap();
        assert_eq!(first, second);

        for candle in &first.candles {
            assert!(candle.is_consistent(), "inconsistent candle: {:?}", candle);
            assert!(candle.low <= candle.open.min(candle.close));
            assert!(candle.high >= candle.open.max(candle.close));
        }
    }
}
