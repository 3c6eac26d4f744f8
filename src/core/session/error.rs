//! Session error types.

use thiserror::Error;

/// Errors raised by the HTTP session layer.
///
/// All of them are reported to the client before any message reaches a
/// server handler.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session id header is missing or names no live session.
    #[error("Invalid or missing session ID")]
    InvalidSession,

    /// A session-less message was not a well-formed `initialize` request.
    #[error("Bad Request: No valid session ID provided")]
    MalformedInitialization,

    /// `initialize` was sent to a session that already has an id.
    #[error("Invalid Request: Server already initialized")]
    AlreadyInitialized,

    /// The registry holds the maximum number of sessions.
    #[error("Session limit of {0} reached")]
    CapacityExceeded(usize),

    /// The generated session id is already registered.
    #[error("Session ID '{0}' is already in use")]
    DuplicateSession(String),

    /// A notification stream is already open for the session.
    #[error("Conflict: Only one SSE stream is allowed per session")]
    StreamConflict,

    /// The session was closed.
    #[error("Session is closed")]
    Closed,
}
