//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Attempt against a backend:
//!     → circuit_breaker.rs (is_open? skip the backend)
//!     → transport call (bounded by connect/request timeouts)
//!     → circuit_breaker.rs (record_success / record_failure)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every outbound call has a deadline
//! - Failover to a different backend instead of backoff on the same one
//! - An open circuit is a skip, never an extra failure

pub mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitState};
