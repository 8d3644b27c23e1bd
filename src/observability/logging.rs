//! Structured logging.
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level when set

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `level` is either a bare level (`info`) applied to this crate and tower-http,
/// or a full filter directive.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn default_filter(level: &str) -> EnvFilter {
    if level.contains('=') || level.contains(',') {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(format!("failover_gateway={level},tower_http={level}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_level_expands_to_crate_targets() {
        let filter = default_filter("debug");
        let rendered = filter.to_string();
        assert!(rendered.contains("failover_gateway=debug"));
        assert!(rendered.contains("tower_http=debug"));
    }

    #[test]
    fn test_directive_passes_through() {
        let filter = default_filter("warn,failover_gateway=trace");
        assert!(filter.to_string().contains("failover_gateway=trace"));
    }
}
