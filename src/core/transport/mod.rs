//! Transport layer for the MCP server.
//!
//! This module provides different transport implementations:
//! - **STDIO**: Standard input/output (default for MCP) - feature: `stdio`
//! - **HTTP**: Session-based HTTP with an SSE notification stream - feature: `http`
//!
//! # Feature Flags
//!
//! Transport implementations are conditionally compiled based on features:
//! - `stdio`: STDIO transport - minimal dependencies
//! - `http`: HTTP transport - adds axum, tower, tower-http, uuid

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "http")]
pub mod jsonrpc;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "http")]
pub use config::HttpConfig;
