//! Error types for beacon configuration.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration {0:?} (expected e.g. \"500ms\", \"10s\", \"2m\", \"1h\")")]
    InvalidDuration(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
