//! Session layer of the HTTP transport.
//!
//! Each client session gets its own [`SessionTransport`] wrapping a fresh
//! `McpServer`; the [`SessionRegistry`] maps session ids to transports.

mod dispatch;
mod error;
mod registry;
mod transport;

pub use error::SessionError;
pub use registry::{SessionRegistry, spawn_idle_sweeper};
pub use transport::{
    NotificationStream, SUPPORTED_PROTOCOL_VERSIONS, SessionState, SessionTransport,
    SessionTransportBuilder, negotiate_protocol_version,
};
