// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic scheduler driving a [`BatchRunner`].
//!
//! One background task per running scheduler. Each tick runs a batch with a
//! retry envelope; a tick that is still busy when the next one is due causes
//! that tick to be skipped, so at most one batch is ever in flight.
//!
//! Cancellation is cooperative: [`Scheduler::stop`] cancels the token, which
//! interrupts the timer wait and retry sleeps but never an in-flight batch.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use courier_config::model::SchedulerConfig;
use courier_core::{BatchRunner, CourierError};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

const STOPPED: u8 = 0;
const RUNNING: u8 = 1;

/// Timing and batching knobs for a [`Scheduler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerOptions {
    pub interval: Duration,
    pub batch_size: usize,
    /// Batch attempts per tick. Zero behaves as one.
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self::from_config(&SchedulerConfig::default())
    }
}

impl SchedulerOptions {
    pub fn from_config(config: &SchedulerConfig) -> Self {
        Self {
            interval: Duration::from_secs(config.interval_secs),
            batch_size: config.batch_size,
            max_retries: config.max_retries,
            retry_delay: Duration::from_secs(config.retry_delay_secs),
        }
    }
}

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Start/stop lifecycle around the background dispatch loop.
pub struct Scheduler {
    options: SchedulerOptions,
    state: AtomicU8,
    processor: RwLock<Option<Arc<dyn BatchRunner>>>,
    // Serializes start/stop; held while `stop` joins the loop.
    slot: Mutex<Option<Running>>,
}

impl Scheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self {
            options,
            state: AtomicU8::new(STOPPED),
            processor: RwLock::new(None),
            slot: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &SchedulerOptions {
        &self.options
    }

    /// Attaches the batch runner used by subsequent starts.
    pub fn set_processor(&self, processor: Arc<dyn BatchRunner>) {
        *self
            .processor
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(processor);
    }

    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::SeqCst) == RUNNING
    }

    /// Spawns the background loop.
    ///
    /// Returns `Ok(false)` without side effects if already running, so
    /// exactly one of several concurrent callers sees `Ok(true)`.
    pub async fn start(&self) -> Result<bool, CourierError> {
        let processor = self
            .processor
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or_else(|| {
                error!("message processor not set");
                CourierError::ProcessorNotSet
            })?;

        let mut slot = self.slot.lock().await;
        if self
            .state
            .compare_exchange(STOPPED, RUNNING, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("scheduler is already running");
            return Ok(false);
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(run_loop(processor, self.options.clone(), token.clone()));
        *slot = Some(Running { token, handle });

        info!(
            interval_ms = self.options.interval.as_millis() as u64,
            batch_size = self.options.batch_size,
            "scheduler started"
        );
        Ok(true)
    }

    /// Cancels the loop and waits for it to exit.
    ///
    /// Returns `Ok(false)` without side effects if not running.
    pub async fn stop(&self) -> Result<bool, CourierError> {
        let mut slot = self.slot.lock().await;
        let Some(running) = slot.take() else {
            warn!("scheduler is not running");
            return Ok(false);
        };

        info!("stopping scheduler");
        running.token.cancel();
        if let Err(e) = running.handle.await {
            error!(error = %e, "scheduler loop terminated abnormally");
        }
        self.state.store(STOPPED, Ordering::SeqCst);
        info!("scheduler stopped");
        Ok(true)
    }
}

async fn run_loop(
    processor: Arc<dyn BatchRunner>,
    options: SchedulerOptions,
    token: CancellationToken,
) {
    let period = options.interval.max(Duration::from_millis(1));
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    ticker.tick().await;

    debug!("scheduler loop started");
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("scheduler loop cancelled");
                break;
            }
            _ = ticker.tick() => {
                process_with_retry(processor.as_ref(), &options, &token).await;
            }
        }
    }
}

/// Runs one batch with up to `max_retries` attempts. Returns whether any
/// attempt succeeded; failures are logged, never propagated.
async fn process_with_retry(
    processor: &dyn BatchRunner,
    options: &SchedulerOptions,
    token: &CancellationToken,
) -> bool {
    let attempts = options.max_retries.max(1);
    for attempt in 1..=attempts {
        match processor.process_batch(options.batch_size).await {
            Ok(()) => {
                if attempt > 1 {
                    info!(attempt, "batch succeeded after retry");
                }
                return true;
            }
            Err(e) => {
                warn!(attempt, max_attempts = attempts, error = %e, "batch processing failed");
            }
        }

        if attempt < attempts {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    info!(attempt, "scheduler stopping, abandoning batch retries");
                    return false;
                }
                _ = tokio::time::sleep(options.retry_delay) => {}
            }
        }
    }

    error!(attempts, "batch processing failed after all retries");
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_test_utils::CountingRunner;

    fn options(interval_ms: u64, max_retries: u32, retry_delay_ms: u64) -> SchedulerOptions {
        SchedulerOptions {
            interval: Duration::from_millis(interval_ms),
            batch_size: 2,
            max_retries,
            retry_delay: Duration::from_millis(retry_delay_ms),
        }
    }

    #[tokio::test]
    async fn start_without_processor_fails() {
        let scheduler = Scheduler::new(options(10, 1, 1));
        let err = scheduler.start().await.unwrap_err();
        assert!(matches!(err, CourierError::ProcessorNotSet));
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn stop_when_stopped_is_ok() {
        let scheduler = Scheduler::new(options(10, 1, 1));
        assert!(!scheduler.stop().await.unwrap());
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_on_interval_not_immediately() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::new(options(100, 1, 1));
        scheduler.set_processor(runner.clone());
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(runner.calls(), 0);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(runner.calls(), 3);

        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_does_not_spawn_second_loop() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::new(options(100, 1, 1));
        scheduler.set_processor(runner.clone());
        assert!(scheduler.start().await.unwrap());
        assert!(!scheduler.start().await.unwrap());
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(450)).await;
        assert_eq!(runner.calls(), 4);

        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_starts_create_one_loop() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Arc::new(Scheduler::new(options(100, 1, 1)));
        scheduler.set_processor(runner.clone());

        let starts = (0..8).map(|_| {
            let s = scheduler.clone();
            tokio::spawn(async move { s.start().await })
        });
        let won = futures::future::join_all(starts)
            .await
            .into_iter()
            .map(|joined| joined.unwrap().unwrap())
            .filter(|started| *started)
            .count();
        assert_eq!(won, 1);

        tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(runner.calls(), 2);
        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn retries_until_success_within_a_tick() {
        let runner = Arc::new(CountingRunner::failing_first(2));
        let scheduler = Scheduler::new(options(1_000, 3, 10));
        scheduler.set_processor(runner.clone());
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_100)).await;
        assert_eq!(runner.calls(), 3);

        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_tick_waits_for_next_fire() {
        let runner = Arc::new(CountingRunner::always_failing());
        let scheduler = Scheduler::new(options(1_000, 2, 10));
        scheduler.set_processor(runner.clone());
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(runner.calls(), 2);
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert_eq!(runner.calls(), 4);

        scheduler.stop().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn stop_aborts_pending_retries() {
        let runner = Arc::new(CountingRunner::always_failing());
        let scheduler = Scheduler::new(options(100, 5, 10_000));
        scheduler.set_processor(runner.clone());
        scheduler.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(runner.calls(), 1);

        scheduler.stop().await.unwrap();
        assert!(!scheduler.is_running());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(runner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_waits_for_in_flight_batch() {
        let runner = Arc::new(CountingRunner::new().with_delay(Duration::from_millis(500)));
        let scheduler = Scheduler::new(options(100, 1, 1));
        scheduler.set_processor(runner.clone());
        scheduler.start().await.unwrap();

        // Let the first batch begin.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(runner.calls(), 1);

        let before = tokio::time::Instant::now();
        scheduler.stop().await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(400));
        assert!(!scheduler.is_running());
        assert_eq!(runner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop() {
        let runner = Arc::new(CountingRunner::new());
        let scheduler = Scheduler::new(options(100, 1, 1));
        scheduler.set_processor(runner.clone());

        scheduler.start().await.unwrap();
        scheduler.stop().await.unwrap();
        scheduler.start().await.unwrap();
        assert!(scheduler.is_running());

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(runner.calls(), 1);
        scheduler.stop().await.unwrap();
    }

    #[test]
    fn options_from_config_defaults() {
        let opts = SchedulerOptions::default();
        assert_eq!(opts.interval, Duration::from_secs(120));
        assert_eq!(opts.batch_size, 2);
        assert_eq!(opts.max_retries, 3);
        assert_eq!(opts.retry_delay, Duration::from_secs(5));
    }
}
