//! Healthy-backend registry.
//!
//! # Responsibilities
//! - Publish the current healthy set as an immutable snapshot
//! - Rebuild the snapshot from a probe sweep over all configured backends
//! - Drop a backend from the snapshot as soon as a request to it fails
//!
//! # Design Decisions
//! - Copy-on-write via `ArcSwap`: readers never block and never see a torn list
//! - Snapshot order always follows configuration order
//! - Sweep failures are never propagated; absence from the snapshot is the signal

use arc_swap::ArcSwap;
use futures_util::future::join_all;
use std::sync::Arc;

use crate::config::{BackendsConfig, HealthCheckConfig};
use crate::observability::metrics;
use crate::transport::HealthProbe;

/// Immutable, ordered list of backend base URLs considered healthy.
pub type HealthSnapshot = Arc<Vec<String>>;

#[derive(Debug)]
pub struct HealthRegistry {
    /// Configured backends, in order.
    backends: Vec<String>,
    /// Path appended to a backend URL when probing.
    health_path: String,
    snapshot: ArcSwap<Vec<String>>,
}

impl HealthRegistry {
    /// Create a registry. Until the first sweep every configured backend is served.
    pub fn new(backends: Vec<String>, health_path: impl Into<String>) -> Self {
        let snapshot = ArcSwap::from_pointee(backends.clone());
        Self {
            backends,
            health_path: health_path.into(),
            snapshot,
        }
    }

    pub fn from_config(backends: &BackendsConfig, health: &HealthCheckConfig) -> Self {
        Self::new(backends.urls.clone(), health.path.clone())
    }

    /// The last published healthy set. Lock-free.
    pub fn snapshot(&self) -> HealthSnapshot {
        self.snapshot.load_full()
    }

    /// All configured backends, healthy or not.
    pub fn backends(&self) -> &[String] {
        &self.backends
    }

    pub fn is_healthy(&self, url: &str) -> bool {
        self.snapshot.load().iter().any(|u| u == url)
    }

    /// Probe every configured backend and publish the healthy ones.
    ///
    /// Probes run concurrently; the published order is the configured order.
    pub async fn sweep(&self, probe: &dyn HealthProbe) -> HealthSnapshot {
        let checks = self.backends.iter().map(|url| async move {
            let target = format!("{}{}", url, self.health_path);
            let result = probe.probe(&target).await;
            (url, result)
        });

        let mut healthy = Vec::with_capacity(self.backends.len());
        for (url, result) in join_all(checks).await {
            metrics::record_backend_health(url, result.is_ok());
            match result {
                Ok(()) => healthy.push(url.clone()),
                Err(e) => {
                    tracing::warn!(backend = %url, error = %e, "Health check failed");
                }
            }
        }

        if healthy.is_empty() {
            tracing::warn!("No healthy backends found");
        } else {
            tracing::info!(healthy = ?healthy, "Health sweep complete");
        }

        let published = Arc::new(healthy);
        self.snapshot.store(published.clone());
        published
    }

    /// Remove `url` from the served snapshot immediately.
    ///
    /// Returns true if the backend was present. The next sweep may restore it.
    pub fn mark_unhealthy(&self, url: &str) -> bool {
        let previous = self.snapshot.rcu(|current| {
            if current.iter().any(|u| u == url) {
                Arc::new(current.iter().filter(|u| *u != url).cloned().collect())
            } else {
                Arc::clone(current)
            }
        });

        let removed = previous.iter().any(|u| u == url);
        if removed {
            tracing::warn!(backend = %url, "Backend marked unhealthy");
            metrics::record_backend_health(url, false);
        }
        removed
    }
}
