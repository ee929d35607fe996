//! Error types for the node agent.

use std::time::Duration;

use thiserror::Error;

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("cannot connect to registry at {addr}: {reason}")]
    Connect { addr: String, reason: String },

    #[error("request to registry failed: {0}")]
    Request(String),

    #[error("registry answered {status}: {body}")]
    Status { status: u16, body: String },

    #[error("cannot decode registry response: {0}")]
    Decode(String),

    #[error("registry did not answer within {0:?}")]
    Timeout(Duration),
}
