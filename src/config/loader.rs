//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse, normalize and validate configuration text.
pub fn parse_config(content: &str) -> Result<GatewayConfig, ConfigError> {
    let mut config: GatewayConfig = toml::from_str(content)?;
    normalize(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Strip trailing slashes so `base_url + path` never doubles the separator.
fn normalize(config: &mut GatewayConfig) {
    for url in &mut config.backends.urls {
        let trimmed = url.trim().trim_end_matches('/').to_string();
        *url = trimmed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let config = parse_config(
            r#"
            [backends]
            urls = ["http://127.0.0.1:9001/", "http://127.0.0.1:9002"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.backends.urls,
            vec!["http://127.0.0.1:9001", "http://127.0.0.1:9002"]
        );
        assert_eq!(config.health_check.path, "/health");
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert!(config.rate_limit.enabled);
        assert_eq!(config.cache.max_size, 1000);
    }

    #[test]
    fn test_parse_full_config() {
        let config = parse_config(
            r#"
            [listener]
            bind_address = "127.0.0.1:8000"

            [backends]
            urls = ["http://a:1"]

            [health_check]
            path = "/status"
            interval_secs = 5

            [timeouts]
            connect_secs = 1
            request_secs = 3

            [circuit_breaker]
            failure_threshold = 5
            open_duration_secs = 15

            [rate_limit]
            enabled = false
            requests_per_minute = 120

            [cache]
            enabled = true
            ttl_secs = 30
            max_size = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
        assert_eq!(config.health_check.path, "/status");
        assert_eq!(config.timeouts.request_secs, 3);
        assert_eq!(config.circuit_breaker.open_duration_secs, 15);
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.cache.ttl_secs, 30);
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_config("[backends\nurls = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_semantic_error_is_validation_error() {
        let err = parse_config("[backends]\nurls = []").unwrap_err();
        match err {
            ConfigError::Validation(errors) => {
                assert_eq!(errors, vec![ValidationError::NoBackends]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
