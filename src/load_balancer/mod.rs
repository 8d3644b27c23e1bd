//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Orchestrator asks for a candidate
//!     → registry.snapshot() (current healthy set)
//!     → round_robin.rs (shared counter modulo snapshot length)
//!     → Return backend URL or NoAvailableBackends
//! ```
//!
//! # Design Decisions
//! - Selection policy holds no per-backend state
//! - Unhealthy backends are excluded by the snapshot, not by the policy
//! - No stickiness across health changes

pub mod round_robin;

pub use round_robin::RoundRobin;

use crate::error::DispatchError;

/// Backend selection policy.
pub trait LoadBalancer: Send + Sync {
    /// Pick the next backend URL from the current healthy set.
    fn select_server(&self) -> Result<String, DispatchError>;
}
