//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (per-client token bucket)
//!     → headers.rs (strip hop-by-hop, set X-Forwarded-For)
//!     → Pass to the retry loop
//! Backend response:
//!     → headers.rs (strip hop-by-hop before relay)
//! ```
//!
//! # Design Decisions
//! - Rejections never reach a backend
//! - No trust in client-supplied forwarding headers

pub mod headers;
pub mod rate_limit;

pub use rate_limit::RateLimiter;
