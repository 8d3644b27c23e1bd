//! Response caching.
//!
//! # Data Flow
//! ```text
//! GET /proxy?path=p
//!     → store.rs get(p): live entry ⇒ serve with X-Cache: HIT
//!     → miss ⇒ dispatch, 2xx ⇒ put(p)
//! POST|PUT|DELETE /proxy?path=p
//!     → evict(p) before dispatch
//! ```

pub mod store;

pub use store::{CacheEntry, ResponseCache};
