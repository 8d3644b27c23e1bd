//! Active health checking.
//!
//! # Responsibilities
//! - Periodically sweep all configured backends
//! - Publish the healthy set through the registry

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::health::registry::HealthRegistry;
use crate::transport::HealthProbe;

pub struct HealthMonitor {
    registry: Arc<HealthRegistry>,
    probe: Arc<dyn HealthProbe>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(registry: Arc<HealthRegistry>, probe: Arc<dyn HealthProbe>, interval: Duration) -> Self {
        Self {
            registry,
            probe,
            interval,
        }
    }

    /// Sweep until shutdown. The first tick fires immediately.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            backends = self.registry.backends().len(),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.registry.sweep(self.probe.as_ref()).await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
