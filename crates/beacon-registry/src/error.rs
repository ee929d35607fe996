//! Error types for the registry store.

use thiserror::Error;

/// Result type alias for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid node address: {0}")]
    InvalidAddress(String),
}
