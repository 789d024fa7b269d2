//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//! - Half-Open: testing if backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: window holds >= minimum_calls and failure rate >= threshold
//! Open → Half-Open: first admission attempt after wait_duration
//! Half-Open → Closed: every trial in the quota succeeded
//! Half-Open → Open: any trial fails
//! ```
//!
//! # Design Decisions
//! - Per-backend circuit breaker (not global), each behind its own mutex
//! - Fail fast in Open state (no waiting for timeout)
//! - Admission hands out a `Permit`; outcomes are recorded through it
//! - Every transition bumps a generation; outcomes of calls admitted under an
//!   older generation are ignored, so late results never skew a fresh window
//! - A permit dropped without an outcome counts as a failure

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use serde::Serialize;

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Numeric encoding for the state gauge.
    pub fn as_gauge(&self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

/// Outcome of one downstream call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
}

#[derive(Debug)]
struct BreakerCore {
    state: CircuitState,
    window: VecDeque<CallOutcome>,
    window_failures: usize,
    opened_at: Option<Instant>,
    trials_admitted: u32,
    trials_succeeded: u32,
    generation: u64,
}

impl BreakerCore {
    fn new(window_size: usize) -> Self {
        Self {
            state: CircuitState::Closed,
            window: VecDeque::with_capacity(window_size),
            window_failures: 0,
            opened_at: None,
            trials_admitted: 0,
            trials_succeeded: 0,
            generation: 0,
        }
    }

    fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window_failures as f64 * 100.0 / self.window.len() as f64
    }

    fn push(&mut self, outcome: CallOutcome, capacity: usize) {
        if self.window.len() == capacity {
            if let Some(CallOutcome::Failure) = self.window.pop_front() {
                self.window_failures -= 1;
            }
        }
        if outcome == CallOutcome::Failure {
            self.window_failures += 1;
        }
        self.window.push_back(outcome);
    }

    fn clear_window(&mut self) {
        self.window.clear();
        self.window_failures = 0;
    }
}

/// Point-in-time view of one breaker.
#[derive(Debug, Clone, Serialize)]
pub struct BreakerSnapshot {
    pub name: String,
    pub state: CircuitState,
    pub buffered_calls: usize,
    pub failed_calls: usize,
    pub failure_rate: f64,
    pub trials_admitted: u32,
}

/// A single backend's circuit breaker.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    config: CircuitBreakerConfig,
    core: Mutex<BreakerCore>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let core = BreakerCore::new(config.sliding_window_size);
        Self {
            name: name.into(),
            config,
            core: Mutex::new(core),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, BreakerCore> {
        self.core.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Ask to make a call. `None` means the circuit rejects it.
    pub fn try_acquire(self: &Arc<Self>) -> Option<Permit> {
        let mut core = self.lock();

        if core.state == CircuitState::Open {
            let waited = core
                .opened_at
                .map(|at| at.elapsed() >= self.config.wait_duration())
                .unwrap_or(true);
            if !waited {
                return None;
            }
            self.transition(&mut core, CircuitState::HalfOpen);
        }

        if core.state == CircuitState::HalfOpen {
            if core.trials_admitted >= self.config.half_open_calls {
                return None;
            }
            core.trials_admitted += 1;
        }

        Some(Permit {
            breaker: Arc::clone(self),
            generation: core.generation,
            resolved: false,
        })
    }

    fn on_outcome(&self, generation: u64, outcome: CallOutcome) {
        let mut core = self.lock();
        if generation != core.generation {
            tracing::trace!(breaker = %self.name, ?outcome, "Ignoring outcome from earlier circuit state");
            return;
        }

        match core.state {
            CircuitState::Closed => {
                core.push(outcome, self.config.sliding_window_size);
                if core.window.len() >= self.config.minimum_calls
                    && core.failure_rate() >= self.config.failure_rate_threshold
                {
                    tracing::error!(
                        breaker = %self.name,
                        failure_rate = core.failure_rate(),
                        calls = core.window.len(),
                        threshold = self.config.failure_rate_threshold,
                        "Circuit breaker OPENED"
                    );
                    self.transition(&mut core, CircuitState::Open);
                }
            }
            CircuitState::HalfOpen => match outcome {
                CallOutcome::Failure => {
                    tracing::warn!(breaker = %self.name, "Trial call failed, circuit re-opened");
                    self.transition(&mut core, CircuitState::Open);
                }
                CallOutcome::Success => {
                    core.trials_succeeded += 1;
                    if core.trials_succeeded >= self.config.half_open_calls {
                        tracing::info!(breaker = %self.name, "Circuit breaker CLOSED - backend recovered");
                        self.transition(&mut core, CircuitState::Closed);
                    }
                }
            },
            CircuitState::Open => {}
        }
    }

    fn transition(&self, core: &mut BreakerCore, to: CircuitState) {
        core.state = to;
        core.generation += 1;
        core.trials_admitted = 0;
        core.trials_succeeded = 0;

        match to {
            CircuitState::Open => {
                core.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                tracing::info!(breaker = %self.name, "Circuit breaker half-open, admitting trial calls");
            }
            CircuitState::Closed => {
                core.opened_at = None;
                core.clear_window();
            }
        }

        metrics::record_breaker_state(&self.name, to);
    }

    /// Current state as last transitioned. An Open breaker whose wait has
    /// elapsed still reports Open until the next admission attempt.
    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let core = self.lock();
        BreakerSnapshot {
            name: self.name.clone(),
            state: core.state,
            buffered_calls: core.window.len(),
            failed_calls: core.window_failures,
            failure_rate: core.failure_rate(),
            trials_admitted: core.trials_admitted,
        }
    }
}

/// Proof of admission. Resolve it with `record`; dropping it unresolved
/// records a failure.
#[derive(Debug)]
pub struct Permit {
    breaker: Arc<CircuitBreaker>,
    generation: u64,
    resolved: bool,
}

impl Permit {
    pub fn record(mut self, outcome: CallOutcome) {
        self.resolved = true;
        self.breaker.on_outcome(self.generation, outcome);
    }

    pub fn breaker(&self) -> &str {
        self.breaker.name()
    }
}

impl Drop for Permit {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::debug!(breaker = %self.breaker.name, "Call abandoned before completion");
            self.breaker.on_outcome(self.generation, CallOutcome::Failure);
        }
    }
}
