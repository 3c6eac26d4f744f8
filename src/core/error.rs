//! Error types and handling for the MCP server.
//!
//! Each domain keeps its own error enum; this module unifies the ones that
//! reach startup and transport code so they propagate with `?`.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the upstream prompt service.
    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::domains::prompts::UpstreamError),

    /// Error originating from a transport.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
