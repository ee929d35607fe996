//! beacon-core: configuration shared by the beacon registry and its agents.
//!
//! Provides the `beacon.toml` file model, the resolved [`RegistryConfig`]
//! with its validation rules, and the human-readable duration format
//! (`"500ms"`, `"10s"`, `"2m"`, `"1h"`) used by both the file and the CLI.

pub mod config;
pub mod duration;
pub mod error;

pub use config::{BeaconFile, RegistryConfig, ServerSection, SweeperSection};
pub use duration::{format_duration, parse_duration};
pub use error::{ConfigError, ConfigResult};

/// Default registry listen port.
pub const DEFAULT_PORT: u16 = 8000;

/// Default interval between expiry sweeps, in seconds.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 10;

/// Default liveness timeout, in seconds.
pub const DEFAULT_LIVENESS_TIMEOUT_SECS: u64 = 15;
