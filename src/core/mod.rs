//! Core module containing shared infrastructure components.
//!
//! This module provides the foundational building blocks for the MCP server,
//! including error handling, configuration, server lifecycle management,
//! the HTTP session layer and transport abstractions.

pub mod client_log;
pub mod config;
pub mod error;
pub mod server;
#[cfg(feature = "http")]
pub mod session;
pub mod transport;

pub use client_log::ClientLogLevel;
pub use config::Config;
pub use error::{Error, Result};
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
