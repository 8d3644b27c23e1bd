//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate backend URLs and reject duplicates
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("no backends configured")]
    NoBackends,

    #[error("backend url {url:?} is invalid: {reason}")]
    InvalidBackendUrl { url: String, reason: String },

    #[error("backend url {0:?} is listed more than once")]
    DuplicateBackend(String),

    #[error("health check path {0:?} must start with '/'")]
    InvalidHealthPath(String),

    #[error("{field} must be greater than zero")]
    MustBePositive { field: &'static str },

    #[error("{field} is not a valid socket address: {value:?}")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backends.urls.is_empty() {
        errors.push(ValidationError::NoBackends);
    }

    let mut seen = HashSet::new();
    for raw in &config.backends.urls {
        match Url::parse(raw) {
            Ok(url) if url.scheme() == "http" => {}
            Ok(url) => errors.push(ValidationError::InvalidBackendUrl {
                url: raw.clone(),
                reason: format!("unsupported scheme {:?}", url.scheme()),
            }),
            Err(e) => errors.push(ValidationError::InvalidBackendUrl {
                url: raw.clone(),
                reason: e.to_string(),
            }),
        }
        if !seen.insert(raw.as_str()) {
            errors.push(ValidationError::DuplicateBackend(raw.clone()));
        }
    }

    if !config.health_check.path.starts_with('/') {
        errors.push(ValidationError::InvalidHealthPath(config.health_check.path.clone()));
    }

    let mut positive = |value: u64, field: &'static str| {
        if value == 0 {
            errors.push(ValidationError::MustBePositive { field });
        }
    };
    positive(config.health_check.interval_secs, "health_check.interval_secs");
    positive(config.timeouts.connect_secs, "timeouts.connect_secs");
    positive(config.timeouts.request_secs, "timeouts.request_secs");
    positive(config.circuit_breaker.failure_threshold as u64, "circuit_breaker.failure_threshold");
    positive(config.circuit_breaker.open_duration_secs, "circuit_breaker.open_duration_secs");
    positive(config.limits.max_body_bytes as u64, "limits.max_body_bytes");
    if config.rate_limit.enabled {
        positive(config.rate_limit.requests_per_minute as u64, "rate_limit.requests_per_minute");
    }
    if config.cache.enabled {
        positive(config.cache.ttl_secs, "cache.ttl_secs");
        positive(config.cache.max_size as u64, "cache.max_size");
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
