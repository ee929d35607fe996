//! beacon-agent: the node side of the registry protocol.
//!
//! A worker runs a [`NodeAgent`] to keep itself listed: it registers
//! immediately on start, re-registers on every heartbeat interval, and
//! refreshes its view of the other healthy nodes on every discovery
//! interval.
//!
//! # Architecture
//!
//! ```text
//! NodeAgent::run
//!   ├── heartbeat tick  → POST /register {"address": <self>}
//!   ├── discovery tick  → GET /nodes → PeerSet::replace (self excluded)
//!   └── shutdown        → return
//! ```
//!
//! Failures are logged and retried on the next tick; the registry's
//! liveness timeout tolerates a missed heartbeat.

pub mod agent;
pub mod client;
pub mod error;

pub use agent::{AgentConfig, NodeAgent, PeerSet};
pub use client::RegistryClient;
pub use error::{AgentError, AgentResult};
