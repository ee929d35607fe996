//! Domain types for the registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One worker's registration state.
///
/// Serialized as `{"address", "lastSeen", "isHealthy"}` with `lastSeen`
/// rendered as an RFC-3339 UTC timestamp.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    /// Network address the node advertises. Unique key in the store.
    pub address: String,
    /// Time of the most recent successful registration.
    pub last_seen: DateTime<Utc>,
    /// Cleared by the sweeper on expiry, restored by the next registration.
    #[serde(rename = "isHealthy")]
    pub healthy: bool,
}

impl NodeRecord {
    /// A freshly registered, healthy record.
    pub fn registered(address: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            address: address.into(),
            last_seen: now,
            healthy: true,
        }
    }
}
