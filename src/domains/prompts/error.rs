//! Prompt-specific error types.

use rmcp::ErrorData as McpError;
use thiserror::Error;

use super::upstream::UpstreamError;

/// JSON-RPC "invalid params" code.
const INVALID_PARAMS: i32 = -32602;
/// JSON-RPC "internal error" code.
const INTERNAL_ERROR: i32 = -32603;

/// Errors that can occur during prompt gateway operations.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The pagination cursor is not a page number.
    #[error("Invalid cursor '{0}': cursor must be a valid page number")]
    InvalidCursor(String),

    /// The request arguments are unusable.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Neither the chat nor the text resolution succeeded.
    #[error("Failed to get prompt for '{name}': {cause}")]
    PromptResolutionFailed {
        name: String,
        #[source]
        cause: UpstreamError,
    },

    /// The listing call (or a per-prompt lookup during listing) failed.
    #[error("Failed to fetch prompts: {0}")]
    UpstreamListFailed(#[source] UpstreamError),
}

impl GatewayError {
    /// Create a new "invalid cursor" error.
    pub fn invalid_cursor(cursor: impl Into<String>) -> Self {
        Self::InvalidCursor(cursor.into())
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// JSON-RPC error code reported to protocol clients.
    pub fn json_rpc_code(&self) -> i32 {
        match self {
            Self::InvalidCursor(_)
            | Self::InvalidArguments(_)
            | Self::PromptResolutionFailed { .. } => INVALID_PARAMS,
            Self::UpstreamListFailed(_) => INTERNAL_ERROR,
        }
    }
}

impl From<GatewayError> for McpError {
    fn from(err: GatewayError) -> Self {
        match err.json_rpc_code() {
            INVALID_PARAMS => McpError::invalid_params(err.to_string(), None),
            _ => McpError::internal_error(err.to_string(), None),
        }
    }
}
