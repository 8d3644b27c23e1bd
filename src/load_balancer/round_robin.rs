//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::DispatchError;
use crate::health::HealthRegistry;
use crate::load_balancer::LoadBalancer;

/// Round-robin selector over the registry's healthy snapshot.
/// Stores an internal counter to rotate through backends.
#[derive(Debug)]
pub struct RoundRobin {
    registry: Arc<HealthRegistry>,
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new(registry: Arc<HealthRegistry>) -> Self {
        Self {
            registry,
            counter: AtomicUsize::new(0),
        }
    }
}

impl LoadBalancer for RoundRobin {
    fn select_server(&self) -> Result<String, DispatchError> {
        let snapshot = self.registry.snapshot();
        if snapshot.is_empty() {
            return Err(DispatchError::NoAvailableBackends);
        }

        // fetch_add wraps on overflow; modulo stays valid.
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % snapshot.len();
        Ok(snapshot[index].clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry(urls: &[&str]) -> Arc<HealthRegistry> {
        Arc::new(HealthRegistry::new(
            urls.iter().map(|u| u.to_string()).collect(),
            "/health",
        ))
    }

    #[test]
    fn test_round_robin() {
        let lb = RoundRobin::new(registry(&["http://a", "http://b"]));

        assert_eq!(lb.select_server().unwrap(), "http://a");
        assert_eq!(lb.select_server().unwrap(), "http://b");
        assert_eq!(lb.select_server().unwrap(), "http://a");
    }

    #[test]
    fn test_empty_snapshot_is_no_available_backends() {
        let lb = RoundRobin::new(registry(&[]));
        assert!(matches!(lb.select_server(), Err(DispatchError::NoAvailableBackends)));
    }

    #[test]
    fn test_follows_snapshot_changes() {
        let registry = registry(&["http://a", "http://b", "http://c"]);
        let lb = RoundRobin::new(registry.clone());

        registry.mark_unhealthy("http://a");
        registry.mark_unhealthy("http://c");
        for _ in 0..4 {
            assert_eq!(lb.select_server().unwrap(), "http://b");
        }
    }

    #[test]
    fn test_counter_wraps() {
        let lb = RoundRobin::new(registry(&["http://a", "http://b", "http://c"]));
        lb.counter.store(usize::MAX, Ordering::Relaxed);

        let first = lb.select_server().unwrap();
        assert_eq!(first, format!("http://{}", ["a", "b", "c"][usize::MAX % 3]));
        // Counter wrapped to zero.
        assert_eq!(lb.select_server().unwrap(), "http://a");
    }
}
