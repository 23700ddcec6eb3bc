//! Circuit breaker for upstream protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: upstream assumed down, calls short-circuit to the fallback
//! - Half-Open: one trial call tests whether the upstream recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure rate >= threshold over the trailing window
//!                (once at least minimum_calls outcomes are buffered)
//! Open → Half-Open: first call after the cooldown becomes the trial
//! Half-Open → Closed: trial succeeds
//! Half-Open → Open: trial fails (or is abandoned)
//! ```
//!
//! # Design Decisions
//! - One breaker per logical upstream name, owned by [`BreakerRegistry`]
//! - Every transition is decided under the breaker's own lock, so concurrent callers
//!   agree on a single trial
//! - The lock is never held across an await

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use serde::Serialize;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::resilience::guard::Guarded;

/// Externally visible breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed,
    Open { since: Instant },
    /// A trial call is in flight.
    HalfOpen,
}

impl Phase {
    fn state(&self) -> BreakerState {
        match self {
            Phase::Closed => BreakerState::Closed,
            Phase::Open { .. } => BreakerState::Open,
            Phase::HalfOpen => BreakerState::HalfOpen,
        }
    }
}

#[derive(Debug)]
struct Inner {
    phase: Phase,
    /// Trailing outcomes while closed, `true` = failure.
    window: VecDeque<bool>,
}

impl Inner {
    fn failures(&self) -> usize {
        self.window.iter().filter(|failed| **failed).count()
    }

    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.failures() as f64 * 100.0 / self.window.len() as f64
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PermitKind {
    Normal,
    Trial,
}

/// Point-in-time view of a breaker, for the admin endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakerStatus {
    pub name: String,
    pub state: BreakerState,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    pub failure_rate: f64,
}

/// A per-upstream circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: BreakerConfig,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: BreakerConfig) -> Self {
        let name = name.into();
        metrics::record_breaker_state(&name, BreakerState::Closed);
        Self {
            inner: Mutex::new(Inner {
                phase: Phase::Closed,
                window: VecDeque::with_capacity(config.sliding_window_size),
            }),
            name,
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current state. An open breaker whose cooldown elapsed still reports `Open`
    /// until the next call claims the trial.
    pub fn state(&self) -> BreakerState {
        self.lock().phase.state()
    }

    pub fn status(&self) -> BreakerStatus {
        let inner = self.lock();
        BreakerStatus {
            name: self.name.clone(),
            state: inner.phase.state(),
            buffered_calls: inner.window.len(),
            failed_calls: inner.failures(),
            failure_rate: inner.failure_rate(),
        }
    }

    /// Ask to place a call. `None` means the call must be short-circuited.
    pub fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut inner = self.lock();
        let phase = inner.phase;
        match phase {
            Phase::Closed => Some(Permit::new(self, PermitKind::Normal)),
            Phase::Open { since } if since.elapsed() >= self.config.open_cooldown() => {
                self.transition(&mut inner, Phase::HalfOpen);
                Some(Permit::new(self, PermitKind::Trial))
            }
            Phase::Open { .. } | Phase::HalfOpen => None,
        }
    }

    fn complete(&self, kind: PermitKind, success: bool) {
        let mut inner = self.lock();
        let phase = inner.phase;
        match (kind, phase) {
            (PermitKind::Trial, Phase::HalfOpen) => {
                if success {
                    inner.window.clear();
                    self.transition(&mut inner, Phase::Closed);
                } else {
                    self.transition(&mut inner, Phase::Open { since: Instant::now() });
                }
            }
            (PermitKind::Normal, Phase::Closed) => {
                inner.window.push_back(!success);
                while inner.window.len() > self.config.sliding_window_size {
                    inner.window.pop_front();
                }
                if inner.window.len() >= self.config.minimum_calls
                    && inner.failure_rate() >= self.config.failure_rate_threshold
                {
                    tracing::warn!(
                        breaker = %self.name,
                        failure_rate = inner.failure_rate(),
                        buffered_calls = inner.window.len(),
                        "Failure rate threshold reached"
                    );
                    inner.window.clear();
                    self.transition(&mut inner, Phase::Open { since: Instant::now() });
                }
            }
            // Outcome of a call admitted before the breaker left Closed.
            _ => {}
        }
    }

    fn transition(&self, inner: &mut Inner, to: Phase) {
        let from = inner.phase.state();
        inner.phase = to;
        let to = to.state();
        if from != to {
            tracing::info!(
                breaker = %self.name,
                from = from.as_str(),
                to = to.as_str(),
                "Circuit breaker transition"
            );
            metrics::record_breaker_transition(&self.name, from, to);
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Admission to call the upstream once.
///
/// Settle it with [`Permit::success`] or [`Permit::failure`]. Dropping an unsettled trial
/// counts as a failed trial; dropping an unsettled normal permit records nothing.
#[must_use]
#[derive(Debug)]
pub struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    kind: PermitKind,
    settled: bool,
}

impl<'a> Permit<'a> {
    fn new(breaker: &'a CircuitBreaker, kind: PermitKind) -> Self {
        Self {
            breaker,
            kind,
            settled: false,
        }
    }

    pub fn is_trial(&self) -> bool {
        self.kind == PermitKind::Trial
    }

    pub fn success(mut self) {
        self.settle(true);
    }

    pub fn failure(mut self) {
        self.settle(false);
    }

    fn settle(&mut self, success: bool) {
        if !self.settled {
            self.settled = true;
            self.breaker.complete(self.kind, success);
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if self.kind == PermitKind::Trial {
            self.settle(false);
        }
    }
}

/// Owns one breaker per logical upstream name.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
        }
    }

    /// Get the breaker for `name`, creating it on first use.
    pub fn breaker(&self, name: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(CircuitBreaker::new(name, self.config.clone())))
            .value()
            .clone()
    }

    /// Register a call site under `name` with the fallback used whenever the call is
    /// short-circuited (`None`) or fails (`Some(error)`).
    pub fn register<I, T, E, F>(&self, name: &str, fallback: F) -> Guarded<I, T, E>
    where
        F: Fn(I, Option<&E>) -> T + Send + Sync + 'static,
    {
        Guarded::new(self.breaker(name), Arc::new(fallback))
    }

    /// Status of every breaker, sorted by name.
    pub fn snapshot(&self) -> Vec<BreakerStatus> {
        let mut statuses: Vec<BreakerStatus> =
            self.breakers.iter().map(|b| b.value().status()).collect();
        statuses.sort_by(|a, b| a.name.cmp(&b.name));
        statuses
    }
}
