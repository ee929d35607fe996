//! Heartbeat sweeper: timer-driven expiry of silent nodes.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use beacon_core::RegistryConfig;
use beacon_registry::RegistryStore;

/// Sweeper timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweeperConfig {
    /// Time between sweeps.
    pub interval: Duration,
    /// Maximum allowed silence before a node is marked unhealthy.
    pub liveness_timeout: Duration,
    /// When set, unhealthy nodes silent this long are removed.
    pub evict_after: Option<Duration>,
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self::from(&RegistryConfig::default())
    }
}

impl From<&RegistryConfig> for SweeperConfig {
    fn from(config: &RegistryConfig) -> Self {
        Self {
            interval: config.sweep_interval,
            liveness_timeout: config.liveness_timeout,
            evict_after: config.evict_after,
        }
    }
}

/// What one sweep changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Addresses newly marked unhealthy.
    pub expired: Vec<String>,
    /// Addresses removed from the registry.
    pub evicted: Vec<String>,
}

impl SweepReport {
    pub fn is_empty(&self) -> bool {
        self.expired.is_empty() && self.evicted.is_empty()
    }
}

/// Periodically demotes nodes that stopped sending heartbeats.
pub struct HeartbeatSweeper {
    store: RegistryStore,
    config: SweeperConfig,
}

impl HeartbeatSweeper {
    pub fn new(store: RegistryStore, config: SweeperConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SweeperConfig {
        &self.config
    }

    /// Run one sweep at the store clock's current time.
    pub async fn sweep_once(&self) -> SweepReport {
        let now = self.store.now();
        let expired = self
            .store
            .sweep_expired(now, self.config.liveness_timeout)
            .await;

        let evicted = match self.config.evict_after {
            Some(after) => self.store.evict_unhealthy(now, after).await,
            None => Vec::new(),
        };

        SweepReport { expired, evicted }
    }

    /// Sweep on every tick until `shutdown` fires.
    ///
    /// The first sweep happens one full interval after start.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let period = self.config.interval;
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            interval = ?self.config.interval,
            liveness_timeout = ?self.config.liveness_timeout,
            evict_after = ?self.config.evict_after,
            "heartbeat sweeper started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.sweep_once().await;
                    if report.is_empty() {
                        debug!("sweep found nothing to expire");
                    } else {
                        info!(
                            expired = report.expired.len(),
                            evicted = report.evicted.len(),
                            "sweep complete"
                        );
                    }
                }
                _ = shutdown.changed() => {
                    info!("heartbeat sweeper shutting down");
                    break;
                }
            }
        }
    }

    /// Move the sweeper onto its own task.
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run(shutdown).await;
        })
    }
}
