//! Circuit breaker for remote call protection.
//!
//! # States
//! - Closed: normal operation, calls pass through and their outcomes are recorded
//! - Open: remote assumed down, calls fail fast without being invoked
//! - Half-Open: a single probe call tests whether the remote recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: recorded calls >= minimum_calls and failure rate >= threshold
//! Open → Half-Open: open_duration elapsed since the breaker opened
//! Half-Open → Closed: probe succeeds (history cleared)
//! Half-Open → Open: probe fails (open timer restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per named operation, owned by a registry rather than a global
//! - All state lives behind one mutex that is never held across the protected call
//! - A permit ties each admitted call to the cycle it was admitted in; outcomes
//!   arriving after the breaker moved on are dropped
//! - Dropping an in-flight probe frees the probe slot without recording anything

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio::time::Instant;

use crate::observability::metrics;
use crate::resilience::fallback;

pub use crate::config::schema::CircuitBreakerConfig;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        }
    }
}

/// Error returned by [`CircuitBreaker::attempt`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker refused to run the operation.
    #[error("circuit breaker '{name}' is open")]
    Open { name: String },

    /// The operation ran and failed; the original error is preserved.
    #[error(transparent)]
    Operation(E),
}

impl<E> BreakerError<E> {
    /// True when the call was short-circuited rather than attempted.
    pub fn is_open(&self) -> bool {
        matches!(self, BreakerError::Open { .. })
    }

    /// The wrapped operation error, if the operation actually ran.
    pub fn into_operation(self) -> Option<E> {
        match self {
            BreakerError::Operation(err) => Some(err),
            BreakerError::Open { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Success,
    Failure,
}

/// Count-based sliding window of call outcomes.
#[derive(Debug)]
struct CallHistory {
    outcomes: VecDeque<Outcome>,
    capacity: usize,
    failures: usize,
}

impl CallHistory {
    fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            outcomes: VecDeque::with_capacity(capacity),
            capacity,
            failures: 0,
        }
    }

    fn record(&mut self, outcome: Outcome) {
        if self.outcomes.len() == self.capacity {
            if let Some(Outcome::Failure) = self.outcomes.pop_front() {
                self.failures -= 1;
            }
        }
        if outcome == Outcome::Failure {
            self.failures += 1;
        }
        self.outcomes.push_back(outcome);
    }

    fn len(&self) -> usize {
        self.outcomes.len()
    }

    fn failure_rate(&self) -> f64 {
        if self.outcomes.is_empty() {
            0.0
        } else {
            self.failures as f64 / self.outcomes.len() as f64
        }
    }

    fn clear(&mut self) {
        self.outcomes.clear();
        self.failures = 0;
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    last_transition: Instant,
    history: CallHistory,
    /// Bumped on every transition; permits from an older cycle are stale.
    generation: u64,
    probe_in_flight: bool,
    rejected_calls: u64,
    trips: u64,
}

/// Point-in-time view of a breaker, for the admin API and logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    /// Failure rate over the window; `None` until `minimum_calls` are recorded.
    pub failure_rate: Option<f64>,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    pub rejected_calls: u64,
    pub trips: u64,
    pub millis_since_transition: u64,
    /// Wait before an open breaker admits a probe; `None` unless open.
    pub millis_until_probe: Option<u64>,
}

fn as_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// A circuit breaker guarding one named operation.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    /// Create a closed breaker.
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, CircuitState::Closed);
        Self {
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                last_transition: Instant::now(),
                history: CallHistory::new(config.sliding_window_size),
                generation: 0,
                probe_in_flight: false,
                rejected_calls: 0,
                trips: 0,
            }),
            name,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state. An expired open period is reported as `Open` until the
    /// next call moves the breaker to half-open.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    /// Run `operation` if the breaker admits it and record its outcome.
    ///
    /// # Errors
    /// Returns [`BreakerError::Open`] without invoking `operation` when the breaker
    /// is open (or a half-open probe is already running), and
    /// [`BreakerError::Operation`] carrying the original error when it fails.
    pub async fn attempt<F, Fut, T, E>(&self, operation: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(permit) = self.try_acquire() else {
            return Err(BreakerError::Open {
                name: self.name.clone(),
            });
        };

        match operation().await {
            Ok(value) => {
                permit.complete(Outcome::Success);
                Ok(value)
            }
            Err(err) => {
                permit.complete(Outcome::Failure);
                Err(BreakerError::Operation(err))
            }
        }
    }

    /// Like [`attempt`](Self::attempt), but any error, including a short-circuit,
    /// is handed to `fallback` and its value returned instead.
    pub async fn fallback_on_failure<F, Fut, T, E, R>(&self, operation: F, fallback: R) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        R: FnOnce(BreakerError<E>) -> T,
    {
        fallback::recover(&self.name, self.attempt(operation).await, fallback)
    }

    /// Force the breaker back to closed with an empty history.
    pub fn reset(&self) {
        let mut inner = self.lock();
        tracing::info!(
            breaker = %self.name,
            previous_state = inner.state.as_str(),
            "Circuit breaker reset manually"
        );
        if inner.state != CircuitState::Closed {
            self.transition(&mut inner, CircuitState::Closed);
        } else {
            inner.history.clear();
            inner.generation += 1;
        }
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        let buffered = inner.history.len();
        let evaluated = buffered > 0 && buffered >= self.config.minimum_calls;
        BreakerSnapshot {
            name: self.name.clone(),
            state: inner.state,
            failure_rate: evaluated.then(|| inner.history.failure_rate()),
            buffered_calls: buffered,
            failed_calls: inner.history.failures,
            rejected_calls: inner.rejected_calls,
            trips: inner.trips,
            millis_since_transition: as_millis(inner.last_transition.elapsed()),
            millis_until_probe: self.remaining_open(&inner).map(as_millis),
        }
    }

    /// Time left before an open breaker admits a probe; `None` unless open.
    fn remaining_open(&self, inner: &BreakerInner) -> Option<Duration> {
        (inner.state == CircuitState::Open).then(|| {
            self.config
                .open_duration()
                .saturating_sub(inner.last_transition.elapsed())
        })
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        // Every critical section leaves the state consistent, so a panic elsewhere
        // while holding the lock does not invalidate it.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();

        if inner.state == CircuitState::Open {
            if inner.last_transition.elapsed() >= self.config.open_duration() {
                self.transition(&mut inner, CircuitState::HalfOpen);
            } else {
                self.reject(&mut inner);
                return None;
            }
        }

        let probe = inner.state == CircuitState::HalfOpen;
        if probe {
            if inner.probe_in_flight {
                self.reject(&mut inner);
                return None;
            }
            inner.probe_in_flight = true;
        }

        Some(Permit {
            breaker: self,
            generation: inner.generation,
            probe,
            completed: false,
        })
    }

    fn reject(&self, inner: &mut BreakerInner) {
        inner.rejected_calls += 1;
        metrics::record_breaker_rejected(&self.name);
        tracing::debug!(
            breaker = %self.name,
            state = inner.state.as_str(),
            "Call not permitted"
        );
    }

    fn on_outcome(&self, generation: u64, outcome: Outcome) {
        let mut inner = self.lock();
        if inner.generation != generation {
            tracing::debug!(
                breaker = %self.name,
                outcome = ?outcome,
                "Discarding outcome from a previous breaker cycle"
            );
            return;
        }

        match inner.state {
            CircuitState::Closed => {
                inner.history.record(outcome);
                let recorded = inner.history.len();
                let rate = inner.history.failure_rate();
                if recorded >= self.config.minimum_calls
                    && rate >= self.config.failure_rate_threshold
                {
                    tracing::warn!(
                        breaker = %self.name,
                        failure_rate = rate,
                        recorded_calls = recorded,
                        threshold = self.config.failure_rate_threshold,
                        "Circuit breaker opening - failure rate above threshold"
                    );
                    self.transition(&mut inner, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => {
                inner.probe_in_flight = false;
                match outcome {
                    Outcome::Success => self.transition(&mut inner, CircuitState::Closed),
                    Outcome::Failure => {
                        tracing::warn!(
                            breaker = %self.name,
                            "Circuit breaker re-opening - probe failed"
                        );
                        self.transition(&mut inner, CircuitState::Open);
                    }
                }
            }
            // Permits are never issued while open, and any transition into open
            // bumps the generation.
            CircuitState::Open => {}
        }
    }

    fn release_probe(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == CircuitState::HalfOpen {
            inner.probe_in_flight = false;
            tracing::debug!(breaker = %self.name, "Probe abandoned before completion");
        }
    }

    fn transition(&self, inner: &mut BreakerInner, to: CircuitState) {
        let from = inner.state;
        inner.state = to;
        inner.last_transition = Instant::now();
        inner.generation += 1;
        inner.probe_in_flight = false;

        match to {
            CircuitState::Closed => inner.history.clear(),
            CircuitState::Open => inner.trips += 1,
            CircuitState::HalfOpen => {}
        }

        tracing::info!(
            breaker = %self.name,
            from = from.as_str(),
            to = to.as_str(),
            "Circuit breaker state change"
        );
        metrics::record_breaker_transition(&self.name, to);
    }
}

/// Admission for one call, tied to the breaker cycle it was issued in.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    probe: bool,
    completed: bool,
}

impl Permit<'_> {
    fn complete(mut self, outcome: Outcome) {
        self.completed = true;
        self.breaker.on_outcome(self.generation, outcome);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.completed && self.probe {
            self.breaker.release_probe(self.generation);
        }
    }
}
