//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: destination assumed down, calls fail fast
//! - Half-Open: testing whether the destination recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures reach fail_max
//! Open → Half-Open: first call attempt after timeout_duration elapsed
//! Half-Open → Closed: probe call succeeds (failure counter resets)
//! Half-Open → Open: probe call fails (cooldown clock restarts)
//! ```
//!
//! # Design Decisions
//! - No background timer; Open → Half-Open happens lazily on a call attempt
//! - Single probe in Half-Open (prevents hammering a recovering backend)
//! - `tokio::time::Instant` for the cooldown clock so tests run under a
//!   paused runtime clock
//! - Besides the `call` combinator, `try_acquire`/`record_*` are public: the
//!   failover controller must record a failure on its global breaker
//!   explicitly after absorbing per-instance errors

use std::sync::Mutex;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

/// Breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum BreakerError<E> {
    /// The breaker rejected the call without running the operation.
    #[error("circuit breaker is open")]
    Open,

    /// The operation ran and failed; the failure has been recorded.
    #[error("{0}")]
    Inner(E),
}

/// Rejection from [`CircuitBreaker::try_acquire`].
#[derive(Debug, Error)]
#[error("circuit breaker {name} is open")]
pub struct BreakerOpen {
    pub name: String,
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    /// Consecutive failures while Closed.
    failures: u32,
    /// Set whenever the breaker enters Open.
    opened_at: Option<Instant>,
}

/// A three-state circuit breaker guarding one destination.
///
/// One instance exists per game-service target, plus one global instance
/// guarding whole failover sequences. All state is in-memory; a restart
/// resets every breaker to Closed.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    fail_max: u32,
    timeout_duration: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, fail_max: u32, timeout_duration: Duration) -> Self {
        Self {
            name: name.into(),
            fail_max,
            timeout_duration,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failures: 0,
                opened_at: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current raw state, without evaluating the cooldown clock.
    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    /// Consecutive failure count (Closed state only).
    pub fn failure_count(&self) -> u32 {
        self.lock().failures
    }

    /// True while the breaker should be skipped entirely: Open, with the
    /// cooldown not yet elapsed. An elapsed Open breaker reports false so
    /// the next call can go through as a recovery probe.
    pub fn is_open(&self) -> bool {
        let inner = self.lock();
        match inner.state {
            BreakerState::Open => !self.cooldown_elapsed(&inner),
            BreakerState::Closed | BreakerState::HalfOpen => false,
        }
    }

    /// Ask permission to run one call.
    ///
    /// Performs the lazy Open → Half-Open transition: the first acquisition
    /// after the cooldown elapses is admitted as the single probe. While a
    /// probe is outstanding (state Half-Open), further acquisitions are
    /// rejected.
    pub fn try_acquire(&self) -> Result<(), BreakerOpen> {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => Ok(()),
            BreakerState::HalfOpen => Err(self.rejection()),
            BreakerState::Open => {
                if self.cooldown_elapsed(&inner) {
                    inner.state = BreakerState::HalfOpen;
                    tracing::info!(breaker = %self.name, "Cooldown elapsed, admitting probe");
                    Ok(())
                } else {
                    Err(self.rejection())
                }
            }
        }
    }

    /// Record a successful call: reset the failure counter and close.
    pub fn record_success(&self) {
        let mut inner = self.lock();
        if inner.state != BreakerState::Closed {
            tracing::info!(breaker = %self.name, "Closing circuit breaker");
        }
        inner.state = BreakerState::Closed;
        inner.failures = 0;
        inner.opened_at = None;
    }

    /// Record a failed call.
    ///
    /// While Closed this increments the consecutive-failure counter and opens
    /// the breaker at `fail_max`. A failed Half-Open probe reopens with a
    /// fresh cooldown clock.
    pub fn record_failure(&self) {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.failures += 1;
                if inner.failures >= self.fail_max {
                    self.open(&mut inner);
                }
            }
            BreakerState::HalfOpen => {
                tracing::warn!(breaker = %self.name, "Probe failed, reopening");
                self.open(&mut inner);
            }
            // Already failing fast; nothing to count.
            BreakerState::Open => {}
        }
    }

    /// Run `op` if the breaker permits it, recording the outcome.
    ///
    /// The lock is only held before and after the await, never across it.
    pub async fn call<F, Fut, T, E>(&self, op: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        self.try_acquire().map_err(|_| BreakerError::Open)?;
        match op().await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(BreakerError::Inner(err))
            }
        }
    }

    fn open(&self, inner: &mut BreakerInner) {
        inner.state = BreakerState::Open;
        inner.opened_at = Some(Instant::now());
        tracing::warn!(
            breaker = %self.name,
            cooldown_secs = self.timeout_duration.as_secs(),
            "Circuit breaker opened"
        );
    }

    fn cooldown_elapsed(&self, inner: &BreakerInner) -> bool {
        inner
            .opened_at
            .map(|at| at.elapsed() >= self.timeout_duration)
            .unwrap_or(true)
    }

    fn rejection(&self) -> BreakerOpen {
        BreakerOpen {
            name: self.name.clone(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        // Inner ops cannot panic while holding the lock, so poisoning is
        // unreachable; recover rather than propagate.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
