use crate::job::{CandleJob, JobReport};
use candle_core::Result;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Outcome of one scheduler tick
#[derive(Debug)]
pub enum TickOutcome {
    Completed(JobReport),
    /// The window was already aggregated successfully
    AlreadyDone(String),
    Failed(candle_core::CandleError),
}

#[derive(Debug, Default)]
struct RunState {
    /// Run key of the last window that completed
    last_completed: Option<String>,
}

/// Triggers [`CandleJob`] once per interval
///
/// A mutex keeps at most one pass in flight, and a window that already
/// succeeded is not aggregated again. Failed windows are left to the next
/// tick; there is no in-process retry.
pub struct CandleScheduler {
    job: Arc<CandleJob>,
    state: Arc<Mutex<RunState>>,
    tick_delay: Duration,
    shutdown_sender: Option<mpsc::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl CandleScheduler {
    pub fn new(job: Arc<CandleJob>, tick_delay_secs: u64) -> Self {
        Self {
            job,
            state: Arc::new(Mutex::new(RunState::default())),
            tick_delay: Duration::from_secs(tick_delay_secs),
            shutdown_sender: None,
            task: None,
        }
    }

    /// Start the background loop
    pub fn start(&mut self) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        self.shutdown_sender = Some(shutdown_tx);

        self.task = Some(tokio::spawn(Self::run_loop(
            self.job.clone(),
            self.state.clone(),
            self.tick_delay,
            shutdown_rx,
        )));
    }

    /// Stop the loop, letting an in-flight pass finish
    pub async fn stop(&mut self) {
        if let Some(sender) = self.shutdown_sender.take() {
            let _ = sender.send(()).await;
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(error = %e, "Candle scheduler task panicked");
            }
        }
    }

    /// Run one tick for `now` outside the background loop
    pub async fn trigger(&self, now: DateTime<Utc>) -> TickOutcome {
        Self::tick(&self.job, &self.state, now).await
    }

    async fn run_loop(
        job: Arc<CandleJob>,
        state: Arc<Mutex<RunState>>,
        tick_delay: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        info!(interval = %job.interval(), "Candle scheduler started");

        loop {
            let wait = match Self::until_next_tick(&job, Utc::now(), tick_delay) {
                Ok(wait) => wait,
                Err(e) => {
                    error!(error = %e, "Cannot schedule candle aggregation, stopping");
                    break;
                }
            };

            tokio::select! {
                _ = shutdown_rx.recv() => {
                    info!("Candle scheduler shutting down");
                    break;
                }
                _ = tokio::time::sleep(wait) => {
                    match Self::tick(&job, &state, Utc::now()).await {
                        TickOutcome::Completed(_) => {}
                        TickOutcome::AlreadyDone(key) => debug!(key = %key, "Window already aggregated"),
                        TickOutcome::Failed(_) => {}
                    }
                }
            }
        }
    }

    async fn tick(job: &CandleJob, state: &Mutex<RunState>, now: DateTime<Utc>) -> TickOutcome {
        let mut state = state.lock().await;

        let key = match job.window_at(now) {
            Ok(window) => window.run_key(),
            Err(e) => return Self::failed(e),
        };
        if state.last_completed.as_deref() == Some(key.as_str()) {
            candle_metrics::counters::aggregation_run("skipped");
            return TickOutcome::AlreadyDone(key);
        }

        match job.run_at(now).await {
            Ok(report) => {
                candle_metrics::counters::aggregation_run("ok");
                state.last_completed = Some(key);
                TickOutcome::Completed(report)
            }
            Err(e) => Self::failed(e),
        }
    }

    fn failed(e: candle_core::CandleError) -> TickOutcome {
        warn!(error = %e, kind = e.kind(), "Candle aggregation pass failed");
        candle_metrics::counters::aggregation_run("failed");
        candle_metrics::counters::errors(1, e.kind());
        TickOutcome::Failed(e)
    }

    /// Time from `now` until the next interval boundary plus `tick_delay`
    fn until_next_tick(job: &CandleJob, now: DateTime<Utc>, tick_delay: Duration) -> Result<Duration> {
        let window = job.window_at(now)?;
        let length = window.end - window.start;
        let delay = ChronoDuration::from_std(tick_delay).unwrap_or_else(|_| ChronoDuration::zero());

        let mut next = window.end + delay;
        if next <= now {
            next += length;
        }
        Ok((next - now).to_std().unwrap_or_default())
    }
}
