//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active sweep (active.rs):
//!     Periodic timer
//!     → Probe every configured backend concurrently
//!     → Publish healthy subset to registry.rs
//!
//! Reactive marking (registry.rs):
//!     Outbound call failed in the orchestrator
//!     → Remove backend from the live snapshot
//!     → Next sweep restores it if the probe passes
//! ```
//!
//! # Design Decisions
//! - Readers load an immutable snapshot; writers publish a new one
//! - Health state is per-backend, keyed by base URL

pub mod active;
pub mod registry;

pub use active::HealthMonitor;
pub use registry::{HealthRegistry, HealthSnapshot};
