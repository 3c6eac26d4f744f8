//! Upstream prompt service error types.

use thiserror::Error;

use super::PromptKind;

/// Errors returned when talking to the prompt-management service.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// The HTTP client could not be constructed.
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The configured base URL cannot be used to build endpoints.
    #[error("Invalid upstream URL: {0}")]
    InvalidUrl(String),

    /// The request never produced a response (connect, timeout, ...).
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status.
    #[error("Upstream returned {status} for {url}: {body}")]
    Status { url: String, status: u16, body: String },

    /// The response body did not have the expected shape.
    #[error("Failed to decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The prompt exists but is of a different type than requested.
    #[error("Prompt '{name}' is not a {expected} prompt (found {actual})")]
    TypeMismatch {
        name: String,
        expected: PromptKind,
        actual: PromptKind,
    },
}

impl UpstreamError {
    /// Create a "status" error.
    pub fn status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Whether the service reported the prompt as missing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}
