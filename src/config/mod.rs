//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse, deserialize, normalize backend URLs)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → each component constructed from its own section
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    BackendsConfig, CacheConfig, CircuitBreakerConfig, GatewayConfig, HealthCheckConfig,
    LimitsConfig, ListenerConfig, ObservabilityConfig, RateLimitConfig, TimeoutConfig,
};
pub use validation::ValidationError;
