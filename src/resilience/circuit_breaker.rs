//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests are skipped
//! - Half-Open: cool-down elapsed, requests let through to test recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive failures >= failure_threshold
//! Open → Half-Open: first is_open() call after open_duration since last failure
//! Half-Open → Closed: any success
//! Half-Open → Open: any failure (the count is cumulative and already >= threshold)
//! ```
//!
//! # Design Decisions
//! - Per-backend record, created on first touch
//! - Each record lives in its own DashMap slot; read-modify-write holds only that slot
//! - Half-Open does not serialize probes: every concurrent caller is let through

use dashmap::DashMap;
use std::time::{Duration, Instant};

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CircuitState {
    /// Normal operation - requests allowed
    #[default]
    Closed,
    /// Circuit tripped - requests skipped
    Open,
    /// Testing recovery - requests allowed
    HalfOpen,
}

impl CircuitState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        }
    }
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-backend failure record.
#[derive(Debug, Clone, Default)]
struct CircuitRecord {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Circuit breaker for backends, keyed by backend base URL.
#[derive(Debug)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    open_duration: Duration,
    circuits: DashMap<String, CircuitRecord>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker.
    pub fn new(failure_threshold: u32, open_duration: Duration) -> Self {
        Self {
            failure_threshold,
            open_duration,
            circuits: DashMap::new(),
        }
    }

    pub fn from_config(config: &CircuitBreakerConfig) -> Self {
        Self::new(config.failure_threshold, config.open_duration())
    }

    /// Returns true if requests to this backend must be skipped.
    ///
    /// An open circuit whose cool-down has elapsed is moved to half-open by this
    /// call, which then reports it as not open.
    pub fn is_open(&self, backend: &str) -> bool {
        let mut record = self.circuits.entry(backend.to_string()).or_default();
        let state = record.state;

        match state {
            CircuitState::Closed | CircuitState::HalfOpen => false,
            CircuitState::Open => {
                let cooled_down = record
                    .last_failure
                    .map_or(true, |at| at.elapsed() >= self.open_duration);
                if cooled_down {
                    record.state = CircuitState::HalfOpen;
                    drop(record);
                    tracing::info!(backend = %backend, "Circuit transitioning to half-open");
                    metrics::record_circuit_transition(backend, CircuitState::HalfOpen);
                    false
                } else {
                    true
                }
            }
        }
    }

    /// Record a successful call: closes the circuit and clears the failure count.
    pub fn record_success(&self, backend: &str) {
        let mut record = self.circuits.entry(backend.to_string()).or_default();
        let previous = record.state;
        record.state = CircuitState::Closed;
        record.consecutive_failures = 0;
        drop(record);

        if previous != CircuitState::Closed {
            tracing::info!(backend = %backend, from = %previous, "Circuit closed (recovered)");
            metrics::record_circuit_transition(backend, CircuitState::Closed);
        }
    }

    /// Record a failed call; opens the circuit once the threshold is reached.
    pub fn record_failure(&self, backend: &str) {
        let mut record = self.circuits.entry(backend.to_string()).or_default();
        record.consecutive_failures = record.consecutive_failures.saturating_add(1);
        record.last_failure = Some(Instant::now());

        let failures = record.consecutive_failures;
        let previous = record.state;
        if failures >= self.failure_threshold {
            record.state = CircuitState::Open;
        }
        drop(record);

        if failures >= self.failure_threshold && previous != CircuitState::Open {
            tracing::warn!(
                backend = %backend,
                failures,
                from = %previous,
                "Circuit opened"
            );
            metrics::record_circuit_transition(backend, CircuitState::Open);
        }
    }

    /// Current state. Unseen backends report Closed without creating a record.
    pub fn get_state(&self, backend: &str) -> CircuitState {
        self.circuits
            .get(backend)
            .map(|r| r.state)
            .unwrap_or_default()
    }

    /// Current consecutive failure count (0 for unseen backends).
    pub fn failure_count(&self, backend: &str) -> u32 {
        self.circuits
            .get(backend)
            .map(|r| r.consecutive_failures)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn breaker(threshold: u32, open_ms: u64) -> CircuitBreaker {
        CircuitBreaker::new(threshold, Duration::from_millis(open_ms))
    }

    #[test]
    fn test_state_display() {
        assert_eq!(CircuitState::Closed.to_string(), "closed");
        assert_eq!(CircuitState::Open.to_string(), "open");
        assert_eq!(CircuitState::HalfOpen.to_string(), "half-open");
    }

    #[test]
    fn test_unseen_backend_is_closed() {
        let cb = breaker(3, 1000);
        assert_eq!(cb.get_state("http://unknown"), CircuitState::Closed);
        assert_eq!(cb.failure_count("http://unknown"), 0);
        assert!(!cb.is_open("http://unknown"));
        assert_eq!(cb.get_state("http://unknown"), CircuitState::Closed);
    }

    #[test]
    fn test_opens_after_exactly_threshold_failures() {
        let cb = breaker(3, 60_000);

        cb.record_failure("b1");
        cb.record_failure("b1");
        assert_eq!(cb.get_state("b1"), CircuitState::Closed);
        assert!(!cb.is_open("b1"));

        cb.record_failure("b1");
        assert_eq!(cb.get_state("b1"), CircuitState::Open);
        assert!(cb.is_open("b1"));
    }

    #[test]
    fn test_success_resets_from_any_state() {
        let cb = breaker(2, 60_000);

        cb.record_failure("b1");
        cb.record_success("b1");
        assert_eq!(cb.failure_count("b1"), 0);
        assert_eq!(cb.get_state("b1"), CircuitState::Closed);

        cb.record_failure("b1");
        cb.record_failure("b1");
        assert_eq!(cb.get_state("b1"), CircuitState::Open);
        cb.record_success("b1");
        assert_eq!(cb.get_state("b1"), CircuitState::Closed);
        assert_eq!(cb.failure_count("b1"), 0);
    }

    #[test]
    fn test_open_until_cool_down_then_half_open() {
        let cb = breaker(1, 30);

        cb.record_failure("b1");
        assert!(cb.is_open("b1"));
        assert_eq!(cb.get_state("b1"), CircuitState::Open);

        thread::sleep(Duration::from_millis(50));

        assert!(!cb.is_open("b1"));
        assert_eq!(cb.get_state("b1"), CircuitState::HalfOpen);
        // Half-open keeps letting callers through.
        assert!(!cb.is_open("b1"));
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let cb = breaker(2, 10);

        cb.record_failure("b1");
        cb.record_failure("b1");
        thread::sleep(Duration::from_millis(20));
        assert!(!cb.is_open("b1"));
        assert_eq!(cb.get_state("b1"), CircuitState::HalfOpen);

        cb.record_failure("b1");
        assert_eq!(cb.get_state("b1"), CircuitState::Open);
        assert_eq!(cb.failure_count("b1"), 3);
        assert!(cb.is_open("b1"));
    }

    #[test]
    fn test_half_open_success_closes() {
        let cb = breaker(1, 10);

        cb.record_failure("b1");
        thread::sleep(Duration::from_millis(20));
        cb.is_open("b1");

        cb.record_success("b1");
        assert_eq!(cb.get_state("b1"), CircuitState::Closed);
        assert_eq!(cb.failure_count("b1"), 0);
    }

    #[test]
    fn test_backends_are_independent() {
        let cb = breaker(1, 60_000);
        cb.record_failure("b1");
        assert!(cb.is_open("b1"));
        assert!(!cb.is_open("b2"));
    }

    #[test]
    fn test_concurrent_failures_are_counted_exactly() {
        let cb = Arc::new(breaker(10_000, 60_000));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cb = cb.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        cb.is_open("b1");
                        cb.record_failure("b1");
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(cb.failure_count("b1"), 800);
    }
}
