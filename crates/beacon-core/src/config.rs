//! beacon.toml configuration parser and the resolved registry config.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8000
//!
//! [sweeper]
//! interval = "10s"
//! liveness_timeout = "15s"
//! evict_after = "1h"   # optional; unset keeps unhealthy nodes forever
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::duration::{format_duration, parse_duration};
use crate::error::{ConfigError, ConfigResult};
use crate::{DEFAULT_LIVENESS_TIMEOUT_SECS, DEFAULT_PORT, DEFAULT_SWEEP_INTERVAL_SECS};

/// On-disk shape of `beacon.toml`. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BeaconFile {
    pub server: Option<ServerSection>,
    pub sweeper: Option<SweeperSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SweeperSection {
    pub interval: Option<String>,
    pub liveness_timeout: Option<String>,
    pub evict_after: Option<String>,
}

impl BeaconFile {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }
}

/// Fully-resolved registry settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Interface to bind the HTTP listener on.
    pub host: String,
    /// Listen port; 0 picks an ephemeral port.
    pub port: u16,
    /// Time between expiry sweeps.
    pub sweep_interval: Duration,
    /// Maximum gap since the last heartbeat before a node is unhealthy.
    pub liveness_timeout: Duration,
    /// Physically remove nodes that have been silent this long. `None`
    /// retains unhealthy nodes for the lifetime of the process.
    pub evict_after: Option<Duration>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            liveness_timeout: Duration::from_secs(DEFAULT_LIVENESS_TIMEOUT_SECS),
            evict_after: None,
        }
    }
}

impl RegistryConfig {
    /// Load `beacon.toml`, filling anything it leaves out with defaults.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        Self::default().overlay(&BeaconFile::from_file(path)?)
    }

    /// Apply the values present in `file` on top of `self`.
    pub fn overlay(mut self, file: &BeaconFile) -> ConfigResult<Self> {
        if let Some(server) = &file.server {
            if let Some(host) = &server.host {
                self.host = host.clone();
            }
            if let Some(port) = server.port {
                self.port = port;
            }
        }
        if let Some(sweeper) = &file.sweeper {
            if let Some(interval) = &sweeper.interval {
                self.sweep_interval = parse_duration(interval)?;
            }
            if let Some(timeout) = &sweeper.liveness_timeout {
                self.liveness_timeout = parse_duration(timeout)?;
            }
            if let Some(evict) = &sweeper.evict_after {
                self.evict_after = Some(parse_duration(evict)?);
            }
        }
        Ok(self)
    }

    /// Check the relationships between settings.
    ///
    /// The liveness timeout must be strictly greater than the sweep
    /// interval so a node that misses exactly one heartbeat window is not
    /// expired.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid("host must not be empty".to_string()));
        }
        if self.sweep_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "sweep interval must be greater than zero".to_string(),
            ));
        }
        if self.liveness_timeout <= self.sweep_interval {
            return Err(ConfigError::Invalid(format!(
                "liveness timeout ({}) must be greater than the sweep interval ({})",
                format_duration(self.liveness_timeout),
                format_duration(self.sweep_interval),
            )));
        }
        if let Some(evict) = self.evict_after {
            if evict.is_zero() {
                return Err(ConfigError::Invalid(
                    "evict_after must be greater than zero".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Render back into the file model (used by `beacond config`).
    pub fn to_file(&self) -> BeaconFile {
        BeaconFile {
            server: Some(ServerSection {
                host: Some(self.host.clone()),
                port: Some(self.port),
            }),
            sweeper: Some(SweeperSection {
                interval: Some(format_duration(self.sweep_interval)),
                liveness_timeout: Some(format_duration(self.liveness_timeout)),
                evict_after: self.evict_after.map(format_duration),
            }),
        }
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(&self.to_file())
            .map_err(|e| ConfigError::Invalid(format!("cannot render config: {e}")))
    }
}
