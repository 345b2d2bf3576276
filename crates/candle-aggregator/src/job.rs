use crate::aggregator::CandleAggregator;
use crate::window::AggregationWindow;
use candle_core::types::IntervalType;
use candle_core::{
    AggregationConfig, CandleStore, InstrumentDirectory, QuoteSource, Result,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Summary of one completed aggregation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub interval_start: DateTime<Utc>,
    pub instruments: usize,
    pub candles_written: usize,
    pub skipped_samples: usize,
    pub skipped_instruments: Vec<u64>,
    pub unquoted_instruments: Vec<u64>,
}

/// Everything one aggregation pass needs, wired once at startup
pub struct CandleJob {
    directory: Arc<dyn InstrumentDirectory>,
    quotes: Arc<dyn QuoteSource>,
    store: Arc<dyn CandleStore>,
    aggregator: CandleAggregator,
    interval: IntervalType,
}

impl CandleJob {
    pub fn new(
        directory: Arc<dyn InstrumentDirectory>,
        quotes: Arc<dyn QuoteSource>,
        store: Arc<dyn CandleStore>,
        config: &AggregationConfig,
    ) -> Self {
        Self {
            directory,
            quotes,
            store,
            aggregator: CandleAggregator::new(config.missing_latest),
            interval: config.interval,
        }
    }

    pub fn interval(&self) -> IntervalType {
        self.interval
    }

    /// Window this job aggregates when triggered at `now`
    pub fn window_at(&self, now: DateTime<Utc>) -> Result<AggregationWindow> {
        AggregationWindow::ending_at(self.interval, now)
    }

    /// Aggregate the interval that closed at or before `now` and persist it
    ///
    /// Any upstream or storage failure aborts the pass before or during the
    /// single batch write, so nothing partial is left behind.
    pub async fn run_at(&self, now: DateTime<Utc>) -> Result<JobReport> {
        let started = Instant::now();
        let window = self.window_at(now)?;

        let instruments = self.directory.list_active_ids().await?;
        candle_metrics::gauges::set_active_instruments(instruments.len());

        if instruments.is_empty() {
            info!(start = %window.start, "No active instruments, nothing to aggregate");
            return Ok(JobReport {
                interval_start: window.start,
                instruments: 0,
                candles_written: 0,
                skipped_samples: 0,
                skipped_instruments: Vec::new(),
                unquoted_instruments: Vec::new(),
            });
        }

        let ids: Vec<u64> = instruments.iter().copied().collect();
        let quotes = self
            .quotes
            .get_quotes(&ids, window.from_time(), window.to_time())
            .await?;

        debug!(
            instruments = ids.len(),
            quote_sets = quotes.len(),
            start = %window.start,
            "Fetched quotes for aggregation"
        );

        let output = self.aggregator.aggregate(&window, &instruments, &quotes)?;
        candle_metrics::counters::samples_skipped(output.skipped_samples as u64);
        candle_metrics::counters::instruments_skipped(
            (output.skipped_instruments.len() + output.unquoted_instruments.len()) as u64,
        );

        let write_started = Instant::now();
        let written = if output.candles.is_empty() {
            0
        } else {
            self.store.insert_batch(&output.candles).await?
        };
        candle_metrics::histograms::db_write_duration(write_started.elapsed());
        candle_metrics::counters::candles_generated(written as u64);
        candle_metrics::gauges::set_last_interval_start(window.start.timestamp());
        candle_metrics::histograms::aggregation_duration(started.elapsed());

        info!(
            interval = %self.interval,
            start = %window.start,
            instruments = instruments.len(),
            written,
            skipped_samples = output.skipped_samples,
            skipped_instruments = output.skipped_instruments.len(),
            unquoted_instruments = output.unquoted_instruments.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Candle batch persisted"
        );

        Ok(JobReport {
            interval_start: window.start,
            instruments: instruments.len(),
            candles_written: written,
            skipped_samples: output.skipped_samples,
            skipped_instruments: output.skipped_instruments,
            unquoted_instruments: output.unquoted_instruments,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use candle_core::types::{CandleQuery, InstrumentQuotes};
    use candle_core::upstream::{InstrumentPage, InstrumentPageRequest};
    use candle_core::{CandleError, MissingLatestPolicy};
    use candle_store::MemoryCandleStore;
    use chrono::{NaiveTime, TimeZone};
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    pub(crate) struct StaticDirectory(pub Vec<u64>);

    #[async_trait]
    impl InstrumentDirectory for StaticDirectory {
        async fn fetch_page(&self, request: &InstrumentPageRequest) -> Result<InstrumentPage> {
            let start = ((request.page - 1) * request.page_size) as usize;
            Ok(InstrumentPage {
                instrument_ids: self
                    .0
                    .iter()
                    .skip(start)
                    .take(request.page_size as usize)
                    .copied()
                    .collect(),
                total_count: Some(self.0.len() as u64),
            })
        }
    }

    /// Quote source returning fixed quotes and recording the requested window
    pub(crate) struct FixedQuotes {
        pub quotes: Vec<InstrumentQuotes>,
        pub fail: bool,
        pub calls: Mutex<Vec<(Vec<u64>, NaiveTime, NaiveTime)>>,
    }

    impl FixedQuotes {
        pub(crate) fn new(quotes: Vec<InstrumentQuotes>) -> Self {
            Self {
                quotes,
                fail: false,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl QuoteSource for FixedQuotes {
        async fn get_quotes(
            &self,
            instrument_ids: &[u64],
            from: NaiveTime,
            to: NaiveTime,
        ) -> Result<Vec<InstrumentQuotes>> {
            self.calls
                .lock()
                .unwrap()
                .push((instrument_ids.to_vec(), from, to));
            if self.fail {
                return Err(CandleError::Upstream("quote service down".to_string()));
            }
            Ok(self.quotes.clone())
        }
    }

    pub(crate) fn job(
        instruments: Vec<u64>,
        quotes: Arc<FixedQuotes>,
        store: Arc<MemoryCandleStore>,
        policy: MissingLatestPolicy,
    ) -> CandleJob {
        let config = AggregationConfig {
            missing_latest: policy,
            ..AggregationConfig::default()
        };
        CandleJob::new(Arc::new(StaticDirectory(instruments)), quotes, store, &config)
    }

    #[tokio::test]
    async fn test_run_persists_one_candle_per_instrument() {
        let quotes = Arc::new(FixedQuotes::new(vec![
            InstrumentQuotes::new(5)
                .with("latest", "100")
                .with("092905", "99.5")
                .with("092930", "101"),
            InstrumentQuotes::new(9).with("latest", "7"),
        ]));
        let store = Arc::new(MemoryCandleStore::new());
        let job = job(vec![5, 9], quotes.clone(), store.clone(), MissingLatestPolicy::Abort);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 1).unwrap();
        let report = job.run_at(now).await.unwrap();

        assert_eq!(report.instruments, 2);
        assert_eq!(report.candles_written, 2);
        assert_eq!(
            report.interval_start,
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 29, 0).unwrap()
        );

        let calls = quotes.calls.lock().unwrap();
        assert_eq!(calls[0].0, vec![5, 9]);
        assert_eq!(calls[0].1, NaiveTime::from_hms_opt(9, 29, 0).unwrap());
        assert_eq!(calls[0].2, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        drop(calls);

        let stored = store
            .get(&CandleQuery::by_key(5, IntervalType::Minute1, report.interval_start))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.open, dec!(99.5));
        assert_eq!(stored.close, dec!(101));
    }

    #[tokio::test]
    async fn test_missing_latest_writes_nothing() {
        let quotes = Arc::new(FixedQuotes::new(vec![
            InstrumentQuotes::new(1).with("latest", "1"),
            InstrumentQuotes::new(2).with("092930", "2"),
        ]));
        let store = Arc::new(MemoryCandleStore::new());
        let job = job(vec![1, 2], quotes, store.clone(), MissingLatestPolicy::Abort);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let err = job.run_at(now).await.unwrap_err();
        assert!(matches!(err, CandleError::MissingLatest(2)));
        assert!(store.list(&CandleQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_instrument_left_out_of_quotes_is_reported() {
        let quotes = Arc::new(FixedQuotes::new(vec![
            InstrumentQuotes::new(1).with("latest", "10")
        ]));
        let store = Arc::new(MemoryCandleStore::new());
        let job = job(vec![1, 2], quotes, store.clone(), MissingLatestPolicy::Abort);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let report = job.run_at(now).await.unwrap();
        assert_eq!(report.candles_written, 1);
        assert_eq!(report.unquoted_instruments, vec![2]);
        assert_eq!(store.list(&CandleQuery::new()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upstream_failure_propagates() {
        let mut source = FixedQuotes::new(Vec::new());
        source.fail = true;
        let store = Arc::new(MemoryCandleStore::new());
        let job = job(vec![1], Arc::new(source), store.clone(), MissingLatestPolicy::Abort);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        assert!(matches!(job.run_at(now).await, Err(CandleError::Upstream(_))));
        assert!(store.list(&CandleQuery::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_instruments_skips_quote_call() {
        let quotes = Arc::new(FixedQuotes::new(Vec::new()));
        let store = Arc::new(MemoryCandleStore::new());
        let job = job(vec![], quotes.clone(), store, MissingLatestPolicy::Abort);

        let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap();
        let report = job.run_at(now).await.unwrap();
        assert_eq!(report.candles_written, 0);
        assert!(quotes.calls.lock().unwrap().is_empty());
    }
}
