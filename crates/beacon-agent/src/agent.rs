//! Node agent: keeps one node registered and tracks its peers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{RwLock, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use beacon_registry::NodeRecord;

use crate::client::RegistryClient;
use crate::error::AgentResult;

/// Configuration for the node agent.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// Registry `host:port`.
    pub registry_addr: String,
    /// Address this node advertises to the registry.
    pub address: String,
    /// Time between registrations. Must stay below the registry's
    /// liveness timeout.
    pub heartbeat_interval: Duration,
    /// Time between peer list refreshes.
    pub discovery_interval: Duration,
    /// Per-request deadline.
    pub request_timeout: Duration,
}

impl AgentConfig {
    pub fn new(registry_addr: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            registry_addr: registry_addr.into(),
            address: address.into(),
            heartbeat_interval: Duration::from_secs(5),
            discovery_interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(3),
        }
    }
}

/// Latest known set of healthy peer addresses. Cheap to clone; clones
/// share the same list.
#[derive(Debug, Clone, Default)]
pub struct PeerSet {
    inner: Arc<RwLock<Vec<String>>>,
}

impl PeerSet {
    /// Swap in a new peer list.
    pub async fn replace(&self, peers: Vec<String>) {
        *self.inner.write().await = peers;
    }

    pub async fn list(&self) -> Vec<String> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}

/// The agent that keeps a node registered.
pub struct NodeAgent {
    config: AgentConfig,
    client: RegistryClient,
    peers: PeerSet,
}

impl NodeAgent {
    pub fn new(config: AgentConfig) -> Self {
        let client = RegistryClient::new(config.registry_addr.clone(), config.request_timeout);
        Self {
            config,
            client,
            peers: PeerSet::default(),
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Handle to the discovered peer list.
    pub fn peers(&self) -> PeerSet {
        self.peers.clone()
    }

    /// Send one heartbeat.
    pub async fn register_once(&self) -> AgentResult<()> {
        self.client.register(&self.config.address).await
    }

    /// Healthy nodes other than this one.
    pub async fn fetch_peers(&self) -> AgentResult<Vec<NodeRecord>> {
        let nodes = self.client.list_nodes().await?;
        Ok(nodes
            .into_iter()
            .filter(|n| n.address != self.config.address)
            .collect())
    }

    /// Refresh the peer set. Returns the number of peers found.
    ///
    /// On failure the previous peer set is kept.
    pub async fn discover_once(&self) -> AgentResult<usize> {
        let peers: Vec<String> = self
            .fetch_peers()
            .await?
            .into_iter()
            .map(|n| n.address)
            .collect();
        let count = peers.len();
        self.peers.replace(peers).await;
        Ok(count)
    }

    /// Heartbeat and discover until `shutdown` fires.
    ///
    /// Registers immediately, then on every heartbeat interval. Discovery
    /// runs immediately and then on every discovery interval.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            registry = %self.config.registry_addr,
            address = %self.config.address,
            heartbeat_interval = ?self.config.heartbeat_interval,
            discovery_interval = ?self.config.discovery_interval,
            "node agent started"
        );

        self.heartbeat().await;

        let hb = self.config.heartbeat_interval;
        let mut heartbeat = tokio::time::interval_at(Instant::now() + hb, hb);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut discovery = tokio::time::interval(self.config.discovery_interval);
        discovery.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = heartbeat.tick() => self.heartbeat().await,
                _ = discovery.tick() => self.discover().await,
                _ = shutdown.changed() => {
                    info!("node agent shutting down");
                    break;
                }
            }
        }
    }

    async fn heartbeat(&self) {
        match self.register_once().await {
            Ok(()) => debug!(address = %self.config.address, "heartbeat sent"),
            Err(e) => warn!(error = %e, "heartbeat failed"),
        }
    }

    async fn discover(&self) {
        match self.discover_once().await {
            Ok(count) => debug!(peers = count, "peer list refreshed"),
            Err(e) => warn!(error = %e, "peer discovery failed"),
        }
    }
}
