// SPDX-FileCopyrightText: 2026 Courier Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Three-state circuit breaker.
//!
//! ```text
//! Closed   --(failures >= failure_threshold)-->  Open
//! Open     --(timeout elapsed, on next call)-->  HalfOpen
//! HalfOpen --(successes >= success_threshold)--> Closed
//! HalfOpen --(any probe failure)-->              Open
//! ```
//!
//! Counters live behind a single mutex that is only held for bookkeeping.
//! The guarded work always runs with the lock released.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};
use strum::Display;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, Serialize)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    /// Calls flow through.
    #[default]
    Closed,
    /// A limited number of probe calls test whether the dependency recovered.
    HalfOpen,
    /// Calls are rejected without touching the dependency.
    Open,
}

/// Tuning for a [`CircuitBreaker`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures in `Closed` that trip the breaker.
    pub failure_threshold: u32,
    /// Consecutive probe successes in `HalfOpen` that close the breaker.
    pub success_threshold: u32,
    /// Time after the last failure before `Open` admits a probe.
    #[serde(rename = "timeout_ms", serialize_with = "serialize_millis")]
    pub timeout: Duration,
    /// Maximum probes in flight while `HalfOpen`.
    pub max_concurrent_probes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 3,
            timeout: Duration::from_secs(30),
            max_concurrent_probes: 1,
        }
    }
}

impl CircuitBreakerConfig {
    /// Replaces zero values with the defaults.
    fn normalized(self) -> Self {
        let defaults = Self::default();
        Self {
            failure_threshold: nonzero_or(self.failure_threshold, defaults.failure_threshold),
            success_threshold: nonzero_or(self.success_threshold, defaults.success_threshold),
            timeout: if self.timeout.is_zero() {
                defaults.timeout
            } else {
                self.timeout
            },
            max_concurrent_probes: nonzero_or(
                self.max_concurrent_probes,
                defaults.max_concurrent_probes,
            ),
        }
    }
}

fn nonzero_or(value: u32, fallback: u32) -> u32 {
    if value == 0 { fallback } else { value }
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Outcome of [`CircuitBreaker::execute`] when the call did not succeed.
#[derive(Debug, Error)]
pub enum CircuitError<E> {
    /// Rejected: the breaker is open and the timeout has not elapsed.
    #[error("circuit breaker is open")]
    Open,
    /// Rejected: the breaker is half-open and the probe limit is reached.
    #[error("circuit breaker is half-open")]
    HalfOpen,
    /// The guarded work ran and failed.
    #[error("{0}")]
    Inner(E),
}

/// Point-in-time view of a breaker, suitable for a status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CircuitMetrics {
    pub name: String,
    pub state: CircuitState,
    pub failure_count: u32,
    pub success_count: u32,
    pub concurrent_calls: u32,
    pub total_calls: u64,
    pub total_failures: u64,
    pub total_successes: u64,
    pub total_rejections: u64,
    pub last_failure_time: Option<DateTime<Utc>>,
    pub config: CircuitBreakerConfig,
}

#[derive(Debug, Default)]
struct Totals {
    calls: u64,
    failures: u64,
    successes: u64,
    rejections: u64,
}

#[derive(Debug, Default)]
struct Inner {
    state: CircuitState,
    /// Bumped on every transition so results of stale probes are ignored.
    epoch: u64,
    failure_count: u32,
    success_count: u32,
    in_flight_probes: u32,
    last_failure: Option<Instant>,
    last_failure_at: Option<DateTime<Utc>>,
    totals: Totals,
}

impl Inner {
    fn stamp_failure(&mut self) {
        self.last_failure = Some(Instant::now());
        self.last_failure_at = Some(Utc::now());
    }
}

#[derive(Debug, Clone, Copy)]
enum Admission {
    Closed,
    Probe { epoch: u64 },
}

/// Holds an admitted call's slot until its result is recorded.
///
/// Dropping an unsettled probe permit (the caller's future was cancelled)
/// frees the probe slot without counting a success or a failure.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    admission: Admission,
    settled: bool,
}

impl Permit<'_> {
    fn settle(mut self, success: bool) {
        self.settled = true;
        self.breaker.record(self.admission, success);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled
            && let Admission::Probe { epoch } = self.admission
        {
            self.breaker.release_probe(epoch);
        }
    }
}

/// Admission-control state machine around a fallible async dependency.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Creates a closed breaker. Zero-valued settings fall back to defaults.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            name: name.into(),
            config: config.normalized(),
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Name used in logs and metrics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Effective configuration.
    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Runs `work` if the breaker admits it.
    ///
    /// Returns [`CircuitError::Open`] or [`CircuitError::HalfOpen`] without
    /// calling `work` when the call is rejected, and [`CircuitError::Inner`]
    /// when `work` itself fails.
    pub async fn execute<F, Fut, T, E>(&self, work: F) -> Result<T, CircuitError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = self.admit()?;
        let result = work().await;
        permit.settle(result.is_ok());
        result.map_err(CircuitError::Inner)
    }

    /// Current state.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Snapshot of counters, totals and configuration.
    pub fn metrics(&self) -> CircuitMetrics {
        let inner = self.lock();
        CircuitMetrics {
            name: self.name.clone(),
            state: inner.state,
            failure_count: inner.failure_count,
            success_count: inner.success_count,
            concurrent_calls: inner.in_flight_probes,
            total_calls: inner.totals.calls,
            total_failures: inner.totals.failures,
            total_successes: inner.totals.successes,
            total_rejections: inner.totals.rejections,
            last_failure_time: inner.last_failure_at,
            config: self.config.clone(),
        }
    }

    /// Trips the breaker now. The open timeout starts from this call.
    pub fn force_open(&self) {
        let mut inner = self.lock();
        inner.stamp_failure();
        self.transition(&mut inner, CircuitState::Open);
    }

    /// Closes the breaker and clears its counters.
    pub fn force_close(&self) {
        let mut inner = self.lock();
        self.transition(&mut inner, CircuitState::Closed);
    }

    /// Returns to a fresh closed breaker, clearing totals as well.
    pub fn reset(&self) {
        let mut inner = self.lock();
        let epoch = inner.epoch + 1;
        *inner = Inner {
            epoch,
            ..Inner::default()
        };
        info!(breaker = %self.name, "circuit breaker reset");
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn admit<E>(&self) -> Result<Permit<'_>, CircuitError<E>> {
        let mut inner = self.lock();
        match inner.state {
            CircuitState::Closed => {
                inner.totals.calls += 1;
                Ok(self.permit(Admission::Closed))
            }
            CircuitState::Open => {
                let cooled = inner
                    .last_failure
                    .is_none_or(|at| at.elapsed() >= self.config.timeout);
                if !cooled {
                    inner.totals.rejections += 1;
                    warn!(
                        breaker = %self.name,
                        timeout_ms = self.config.timeout.as_millis() as u64,
                        "circuit breaker is open, call rejected"
                    );
                    return Err(CircuitError::Open);
                }
                self.transition(&mut inner, CircuitState::HalfOpen);
                self.admit_probe(&mut inner)
            }
            CircuitState::HalfOpen => self.admit_probe(&mut inner),
        }
    }

    fn admit_probe<E>(&self, inner: &mut Inner) -> Result<Permit<'_>, CircuitError<E>> {
        if inner.in_flight_probes >= self.config.max_concurrent_probes {
            inner.totals.rejections += 1;
            warn!(
                breaker = %self.name,
                in_flight = inner.in_flight_probes,
                "half-open probe limit reached, call rejected"
            );
            return Err(CircuitError::HalfOpen);
        }
        inner.in_flight_probes += 1;
        inner.totals.calls += 1;
        Ok(self.permit(Admission::Probe { epoch: inner.epoch }))
    }

    fn permit(&self, admission: Admission) -> Permit<'_> {
        Permit {
            breaker: self,
            admission,
            settled: false,
        }
    }

    fn record(&self, admission: Admission, success: bool) {
        let mut inner = self.lock();
        if success {
            inner.totals.successes += 1;
        } else {
            inner.totals.failures += 1;
        }

        match admission {
            Admission::Closed => {
                if success {
                    if inner.state == CircuitState::Closed {
                        inner.failure_count = 0;
                    }
                    return;
                }
                inner.failure_count = inner.failure_count.saturating_add(1);
                inner.stamp_failure();
                debug!(
                    breaker = %self.name,
                    failure_count = inner.failure_count,
                    threshold = self.config.failure_threshold,
                    "call failed while closed"
                );
                if inner.state == CircuitState::Closed
                    && inner.failure_count >= self.config.failure_threshold
                {
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            Admission::Probe { epoch } => {
                if epoch != inner.epoch {
                    return;
                }
                inner.in_flight_probes = inner.in_flight_probes.saturating_sub(1);
                if success {
                    inner.success_count += 1;
                    info!(
                        breaker = %self.name,
                        success_count = inner.success_count,
                        threshold = self.config.success_threshold,
                        "half-open probe succeeded"
                    );
                    if inner.success_count >= self.config.success_threshold {
                        self.transition(&mut inner, CircuitState::Closed);
                    }
                } else {
                    inner.stamp_failure();
                    warn!(breaker = %self.name, "half-open probe failed");
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
        }
    }

    fn release_probe(&self, epoch: u64) {
        let mut inner = self.lock();
        if inner.epoch == epoch {
            inner.in_flight_probes = inner.in_flight_probes.saturating_sub(1);
        }
    }

    /// Moves to `to`. Re-entering the current state is a no-op.
    fn transition(&self, inner: &mut Inner, to: CircuitState) {
        let from = inner.state;
        if from == to {
            return;
        }
        inner.state = to;
        inner.epoch += 1;
        inner.success_count = 0;
        inner.in_flight_probes = 0;
        match to {
            CircuitState::Open => warn!(
                breaker = %self.name,
                %from,
                %to,
                failure_count = inner.failure_count,
                "circuit breaker opened"
            ),
            CircuitState::HalfOpen => {
                info!(breaker = %self.name, %from, %to, "circuit breaker half-open")
            }
            CircuitState::Closed => {
                inner.failure_count = 0;
                info!(breaker = %self.name, %from, %to, "circuit breaker closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn breaker(failures: u32, successes: u32, timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                failure_threshold: failures,
                success_threshold: successes,
                timeout,
                max_concurrent_probes: 1,
            },
        )
    }

    async fn fail(cb: &CircuitBreaker, calls: &AtomicU32) -> Result<(), CircuitError<&'static str>> {
        cb.execute(move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err::<(), _>("boom")
        })
        .await
    }

    async fn succeed(cb: &CircuitBreaker, calls: &AtomicU32) -> Result<u32, CircuitError<&'static str>> {
        cb.execute(move || async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) })
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn opens_after_threshold_and_rejects_without_calling() {
        let cb = breaker(3, 1, Duration::from_secs(10));
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            assert!(matches!(fail(&cb, &calls).await, Err(CircuitError::Inner("boom"))));
        }
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let rejected = succeed(&cb, &calls).await;
        assert!(matches!(rejected, Err(CircuitError::Open)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(cb.metrics().total_rejections, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn success_in_closed_resets_failure_count() {
        let cb = breaker(3, 1, Duration::from_secs(10));
        let calls = AtomicU32::new(0);

        fail(&cb, &calls).await.unwrap_err();
        fail(&cb, &calls).await.unwrap_err();
        succeed(&cb, &calls).await.unwrap();
        assert_eq!(cb.metrics().failure_count, 0);

        fail(&cb, &calls).await.unwrap_err();
        fail(&cb, &calls).await.unwrap_err();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn stays_open_until_timeout_elapses() {
        let cb = breaker(1, 1, Duration::from_secs(10));
        let calls = AtomicU32::new(0);
        fail(&cb, &calls).await.unwrap_err();

        tokio::time::advance(Duration::from_millis(9_999)).await;
        assert!(matches!(succeed(&cb, &calls).await, Err(CircuitError::Open)));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(succeed(&cb, &calls).await.unwrap(), 2);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn successful_probe_closes_with_single_success_threshold() {
        let cb = breaker(3, 1, Duration::from_secs(5));
        let calls = AtomicU32::new(0);
        for _ in 0..3 {
            fail(&cb, &calls).await.unwrap_err();
        }

        tokio::time::advance(Duration::from_secs(5)).await;
        succeed(&cb, &calls).await.unwrap();

        let metrics = cb.metrics();
        assert_eq!(metrics.state, CircuitState::Closed);
        assert_eq!(metrics.failure_count, 0);
        assert_eq!(metrics.success_count, 0);
        assert_eq!(metrics.concurrent_calls, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn failing_probe_reopens_and_resets_success_count() {
        let cb = breaker(1, 2, Duration::from_secs(5));
        let calls = AtomicU32::new(0);
        fail(&cb, &calls).await.unwrap_err();

        tokio::time::advance(Duration::from_secs(5)).await;
        succeed(&cb, &calls).await.unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.metrics().success_count, 1);

        fail(&cb, &calls).await.unwrap_err();
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.metrics().success_count, 0);

        // The failed probe restarts the open timeout.
        let before = calls.load(Ordering::SeqCst);
        assert!(matches!(succeed(&cb, &calls).await, Err(CircuitError::Open)));
        assert_eq!(calls.load(Ordering::SeqCst), before);
    }

    #[tokio::test(start_paused = true)]
    async fn half_open_rejects_beyond_probe_limit() {
        let cb = Arc::new(breaker(1, 1, Duration::from_secs(1)));
        let calls = AtomicU32::new(0);
        fail(&cb, &calls).await.unwrap_err();
        tokio::time::advance(Duration::from_secs(1)).await;

        let (started_tx, started_rx) = tokio::sync::oneshot::channel::<()>();
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let probe = {
            let cb = Arc::clone(&cb);
            tokio::spawn(async move {
                cb.execute(move || async move {
                    let _ = started_tx.send(());
                    let _ = release_rx.await;
                    Ok::<_, &'static str>("probed")
                })
                .await
            })
        };
        started_rx.await.unwrap();
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        assert_eq!(cb.metrics().concurrent_calls, 1);

        let before = calls.load(Ordering::SeqCst);
        assert!(matches!(succeed(&cb, &calls).await, Err(CircuitError::HalfOpen)));
        assert_eq!(calls.load(Ordering::SeqCst), before);

        release_tx.send(()).unwrap();
        assert_eq!(probe.await.unwrap().unwrap(), "probed");
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_probe_frees_its_slot() {
        let cb = breaker(1, 1, Duration::from_secs(1));
        let calls = AtomicU32::new(0);
        fail(&cb, &calls).await.unwrap_err();
        tokio::time::advance(Duration::from_secs(1)).await;

        let slow = cb.execute(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, &'static str>(())
        });
        assert!(tokio::time::timeout(Duration::from_millis(10), slow).await.is_err());
        assert_eq!(cb.metrics().concurrent_calls, 0);

        succeed(&cb, &calls).await.unwrap();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn force_controls_and_reset() {
        let cb = breaker(5, 1, Duration::from_secs(30));
        let calls = AtomicU32::new(0);

        cb.force_open();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(matches!(succeed(&cb, &calls).await, Err(CircuitError::Open)));

        cb.force_close();
        assert_eq!(cb.state(), CircuitState::Closed);
        succeed(&cb, &calls).await.unwrap();

        cb.reset();
        let metrics = cb.metrics();
        assert_eq!(metrics.total_calls, 0);
        assert_eq!(metrics.total_rejections, 0);
        assert!(metrics.last_failure_time.is_none());
    }

    #[test]
    fn zero_config_values_fall_back_to_defaults() {
        let cb = CircuitBreaker::new(
            "zero",
            CircuitBreakerConfig {
                failure_threshold: 0,
                success_threshold: 0,
                timeout: Duration::ZERO,
                max_concurrent_probes: 0,
            },
        );
        assert_eq!(cb.config(), &CircuitBreakerConfig::default());
    }

    #[tokio::test]
    async fn metrics_serialize_for_status_endpoint() {
        let cb = breaker(1, 1, Duration::from_secs(10));
        let calls = AtomicU32::new(0);
        fail(&cb, &calls).await.unwrap_err();

        let json = serde_json::to_value(cb.metrics()).unwrap();
        assert_eq!(json["state"], "OPEN");
        assert_eq!(json["total_failures"], 1);
        assert_eq!(json["config"]["timeout_ms"], 10_000);
        assert_eq!(json["config"]["failure_threshold"], 1);
        assert!(json["last_failure_time"].is_string());
    }

    #[test]
    fn state_display_matches_wire_names() {
        assert_eq!(CircuitState::HalfOpen.to_string(), "HALF_OPEN");
        assert_eq!(CircuitState::Closed.to_string(), "CLOSED");
    }
}
