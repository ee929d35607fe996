//! RegistryStore: the single owner of node liveness state.
//!
//! All access goes through a `tokio::sync::RwLock`: `upsert`,
//! `sweep_expired` and `evict_unhealthy` take the write lock,
//! `snapshot_healthy` and `len` take the read lock. Callers only ever
//! receive owned copies of records.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::error::{RegistryError, RegistryResult};
use crate::types::NodeRecord;

/// Thread-safe node registry.
#[derive(Clone)]
pub struct RegistryStore {
    nodes: Arc<RwLock<HashMap<String, NodeRecord>>>,
    clock: Arc<dyn Clock>,
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryStore {
    /// Create an empty store driven by the wall clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Create an empty store driven by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            nodes: Arc::new(RwLock::new(HashMap::new())),
            clock,
        }
    }

    /// Current time according to the store's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Insert or refresh the record for `address`.
    ///
    /// `last_seen` and `healthy` are always assigned here, never taken
    /// from the caller. `last_seen` never moves backwards for an address,
    /// even if the clock does. Returns a copy of the stored record.
    pub async fn upsert(&self, address: &str) -> RegistryResult<NodeRecord> {
        if address.trim().is_empty() {
            return Err(RegistryError::InvalidAddress(
                "address must not be empty".to_string(),
            ));
        }

        let mut nodes = self.nodes.write().await;
        // Stamp under the lock so timestamps follow write order.
        let now = self.clock.now();

        let record = match nodes.get_mut(address) {
            Some(existing) => {
                if !existing.healthy {
                    info!(%address, "node recovered");
                }
                existing.last_seen = existing.last_seen.max(now);
                existing.healthy = true;
                debug!(%address, "node refreshed");
                existing.clone()
            }
            None => {
                let record = NodeRecord::registered(address, now);
                nodes.insert(address.to_string(), record.clone());
                debug!(%address, "node registered");
                record
            }
        };

        Ok(record)
    }

    /// Copies of every record that is healthy right now, ordered by address.
    pub async fn snapshot_healthy(&self) -> Vec<NodeRecord> {
        let nodes = self.nodes.read().await;
        let mut healthy: Vec<NodeRecord> = nodes.values().filter(|n| n.healthy).cloned().collect();
        drop(nodes);

        healthy.sort_by(|a, b| a.address.cmp(&b.address));
        healthy
    }

    /// Mark every healthy record silent for longer than `timeout` as
    /// unhealthy.
    ///
    /// A record exactly `timeout` old stays healthy. Already-unhealthy
    /// records are left alone, so repeating a sweep at the same `now` is
    /// a no-op. Returns the addresses that changed, ordered.
    pub async fn sweep_expired(&self, now: DateTime<Utc>, timeout: Duration) -> Vec<String> {
        let Ok(timeout) = TimeDelta::from_std(timeout) else {
            // Larger than any representable gap.
            return Vec::new();
        };

        let mut nodes = self.nodes.write().await;
        let mut expired = Vec::new();

        for (address, node) in nodes.iter_mut() {
            if node.healthy && now.signed_duration_since(node.last_seen) > timeout {
                node.healthy = false;
                warn!(%address, last_seen = %node.last_seen, "node is unhealthy");
                expired.push(address.clone());
            }
        }
        drop(nodes);

        expired.sort();
        expired
    }

    /// Physically remove unhealthy records whose last heartbeat is older
    /// than `older_than`. Healthy records are never removed.
    ///
    /// Returns the removed addresses, ordered.
    pub async fn evict_unhealthy(&self, now: DateTime<Utc>, older_than: Duration) -> Vec<String> {
        let Ok(older_than) = TimeDelta::from_std(older_than) else {
            return Vec::new();
        };

        let mut nodes = self.nodes.write().await;
        let mut evicted = Vec::new();

        nodes.retain(|address, node| {
            let stale = !node.healthy && now.signed_duration_since(node.last_seen) > older_than;
            if stale {
                info!(%address, last_seen = %node.last_seen, "evicted unhealthy node");
                evicted.push(address.clone());
            }
            !stale
        });
        drop(nodes);

        evicted.sort();
        evicted
    }

    /// Total number of records, healthy or not.
    pub async fn len(&self) -> usize {
        self.nodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.nodes.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    const TIMEOUT: Duration = Duration::from_secs(15);

    fn test_store() -> (RegistryStore, ManualClock) {
        let clock = ManualClock::at_epoch();
        let store = RegistryStore::with_clock(Arc::new(clock.clone()));
        (store, clock)
    }

    fn secs(n: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(n, 0).unwrap()
    }

    fn millis(n: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(n).unwrap()
    }

    #[tokio::test]
    async fn upsert_creates_healthy_record() {
        let (store, clock) = test_store();
        clock.advance(Duration::from_secs(3));

        let record = store.upsert("10.0.0.1:9000").await.unwrap();
        assert_eq!(record.address, "10.0.0.1:9000");
        assert_eq!(record.last_seen, secs(3));
        assert!(record.healthy);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn upsert_rejects_blank_address() {
        let (store, _) = test_store();
        assert!(matches!(
            store.upsert("").await,
            Err(RegistryError::InvalidAddress(_))
        ));
        assert!(store.upsert("   ").await.is_err());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn reregistration_keeps_one_record_with_latest_time() {
        let (store, clock) = test_store();
        store.upsert("a:1").await.unwrap();
        clock.advance(Duration::from_secs(5));
        store.upsert("a:1").await.unwrap();

        let listed = store.snapshot_healthy().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].last_seen, secs(5));
        assert!(listed[0].healthy);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn last_seen_never_moves_backwards() {
        let (store, clock) = test_store();
        clock.set(secs(100));
        store.upsert("a:1").await.unwrap();

        clock.set(secs(40));
        let record = store.upsert("a:1").await.unwrap();
        assert_eq!(record.last_seen, secs(100));
    }

    #[tokio::test]
    async fn expiry_threshold_is_strict() {
        let (store, _) = test_store();
        store.upsert("a:1").await.unwrap();

        // Just under and exactly at the timeout: still healthy.
        assert!(store.sweep_expired(millis(14_999), TIMEOUT).await.is_empty());
        assert!(store.sweep_expired(secs(15), TIMEOUT).await.is_empty());
        assert_eq!(store.snapshot_healthy().await.len(), 1);

        // Just over: expired.
        let expired = store.sweep_expired(millis(15_001), TIMEOUT).await;
        assert_eq!(expired, vec!["a:1".to_string()]);
        assert!(store.snapshot_healthy().await.is_empty());
    }

    #[tokio::test]
    async fn sweep_is_idempotent_and_retains_records() {
        let (store, _) = test_store();
        store.upsert("a:1").await.unwrap();

        assert_eq!(store.sweep_expired(secs(20), TIMEOUT).await.len(), 1);
        assert!(store.sweep_expired(secs(20), TIMEOUT).await.is_empty());
        assert!(store.sweep_expired(secs(500), TIMEOUT).await.is_empty());

        // Unhealthy records stay in the map.
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn listing_filters_unhealthy() {
        let (store, clock) = test_store();
        store.upsert("b:1").await.unwrap();
        clock.advance(Duration::from_secs(10));
        store.upsert("a:1").await.unwrap();

        store.sweep_expired(secs(20), TIMEOUT).await;

        let listed = store.snapshot_healthy().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].address, "a:1");
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn registration_resurrects_unhealthy_node() {
        let (store, clock) = test_store();
        store.upsert("a:1").await.unwrap();
        store.sweep_expired(secs(16), TIMEOUT).await;
        assert!(store.snapshot_healthy().await.is_empty());

        clock.set(secs(16));
        store.upsert("a:1").await.unwrap();

        let listed = store.snapshot_healthy().await;
        assert_eq!(listed, vec![NodeRecord::registered("a:1", secs(16))]);
    }

    #[tokio::test]
    async fn snapshot_is_detached_from_store() {
        let (store, _) = test_store();
        store.upsert("a:1").await.unwrap();

        let before = store.snapshot_healthy().await;
        store.sweep_expired(secs(60), TIMEOUT).await;

        assert_eq!(before.len(), 1);
        assert!(before[0].healthy);
        assert!(store.snapshot_healthy().await.is_empty());
    }

    #[tokio::test]
    async fn snapshot_is_ordered_by_address() {
        let (store, _) = test_store();
        for addr in ["c:1", "a:1", "b:1"] {
            store.upsert(addr).await.unwrap();
        }
        let addrs: Vec<_> = store
            .snapshot_healthy()
            .await
            .into_iter()
            .map(|n| n.address)
            .collect();
        assert_eq!(addrs, ["a:1", "b:1", "c:1"]);
    }

    #[tokio::test]
    async fn sweep_ignores_future_timestamps() {
        let (store, clock) = test_store();
        clock.set(secs(100));
        store.upsert("a:1").await.unwrap();

        assert!(store.sweep_expired(secs(10), TIMEOUT).await.is_empty());
    }

    #[tokio::test]
    async fn huge_timeout_never_expires() {
        let (store, _) = test_store();
        store.upsert("a:1").await.unwrap();
        assert!(store.sweep_expired(secs(1_000_000), Duration::MAX).await.is_empty());
    }

    #[tokio::test]
    async fn eviction_only_removes_stale_unhealthy_records() {
        let (store, clock) = test_store();
        store.upsert("old:1").await.unwrap();
        clock.set(secs(50));
        store.upsert("fresh:1").await.unwrap();
        store.upsert("recent-dead:1").await.unwrap();

        // old:1 and recent-dead:1 expire; fresh:1 heartbeats again.
        clock.set(secs(70));
        store.upsert("fresh:1").await.unwrap();
        let expired = store.sweep_expired(secs(70), TIMEOUT).await;
        assert_eq!(expired, vec!["old:1".to_string(), "recent-dead:1".to_string()]);

        let evicted = store.evict_unhealthy(secs(70), Duration::from_secs(60)).await;
        assert_eq!(evicted, vec!["old:1".to_string()]);
        assert_eq!(store.len().await, 2);

        // A healthy record is never evicted no matter how old.
        let evicted = store.evict_unhealthy(secs(10_000), Duration::from_secs(1)).await;
        assert_eq!(evicted, vec!["recent-dead:1".to_string()]);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_registrations_and_listing_see_whole_records() {
        let (store, clock) = test_store();
        clock.set(secs(1_000));

        let mut handles = Vec::new();
        for i in 0..64 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.upsert(&format!("10.0.0.{i}:9000")).await.unwrap();
            }));
        }

        let reader = {
            let store = store.clone();
            tokio::spawn(async move {
                let mut seen = Vec::new();
                for _ in 0..16 {
                    seen.push(store.snapshot_healthy().await);
                    tokio::task::yield_now().await;
                }
                seen
            })
        };

        for h in handles {
            h.await.unwrap();
        }
        for listing in reader.await.unwrap() {
            assert!(listing.len() <= 64);
            for node in listing {
                assert!(node.healthy);
                assert_eq!(node.last_seen, secs(1_000));
            }
        }

        assert_eq!(store.snapshot_healthy().await.len(), 64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sweeps_and_registrations_stay_consistent() {
        let (store, clock) = test_store();
        for i in 0..32 {
            store.upsert(&format!("n{i}:1")).await.unwrap();
        }
        clock.set(secs(100));

        let sweeper = {
            let store = store.clone();
            tokio::spawn(async move { store.sweep_expired(secs(100), TIMEOUT).await })
        };
        let writers: Vec<_> = (0..32)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move { store.upsert(&format!("n{i}:1")).await.unwrap() })
            })
            .collect();

        sweeper.await.unwrap();
        for w in writers {
            w.await.unwrap();
        }

        // Every registration ran either before or after the sweep; either
        // way the final upsert leaves the node healthy at t=100.
        let listed = store.snapshot_healthy().await;
        assert_eq!(listed.len(), 32);
        assert!(listed.iter().all(|n| n.last_seen == secs(100)));
    }

    #[tokio::test]
    async fn end_to_end_expiry_and_recovery() {
        let (store, clock) = test_store();

        store.upsert("10.0.0.1:9000").await.unwrap();
        let listed = store.snapshot_healthy().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].address, "10.0.0.1:9000");
        assert!(listed[0].healthy);

        clock.advance(Duration::from_secs(16));
        store.sweep_expired(store.now(), TIMEOUT).await;
        assert!(store.snapshot_healthy().await.is_empty());

        store.upsert("10.0.0.1:9000").await.unwrap();
        let listed = store.snapshot_healthy().await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].last_seen, secs(16));
    }
}
