//! beacon-registry: the node registry state store.
//!
//! Holds one [`NodeRecord`] per advertised address and exposes the only
//! three ways that state changes or is observed:
//!
//! | Operation | Lock | Effect |
//! |---|---|---|
//! | [`RegistryStore::upsert`] | write | insert or refresh, stamp `last_seen`, force healthy |
//! | [`RegistryStore::snapshot_healthy`] | read | owned copies of every healthy record |
//! | [`RegistryStore::sweep_expired`] | write | mark silent nodes unhealthy |
//!
//! # Architecture
//!
//! The map lives behind a `tokio::sync::RwLock` inside an `Arc`, so the
//! store is `Clone + Send + Sync` and can be handed to every request task
//! and to the background sweeper. Writers are serialized against each
//! other and against readers; readers run concurrently. Nothing outside
//! this crate can reach the map.
//!
//! Time comes from an injected [`Clock`], which lets tests move time
//! forward without sleeping.

pub mod clock;
pub mod error;
pub mod store;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{RegistryError, RegistryResult};
pub use store::RegistryStore;
pub use types::NodeRecord;
