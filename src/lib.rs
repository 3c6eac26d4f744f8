//! Langfuse Prompts MCP Server Library
//!
//! A Model Context Protocol (MCP) server that exposes prompts stored in
//! Langfuse to MCP clients, over STDIO or session-based HTTP.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the server handler, the HTTP
//!   session layer and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **prompts**: Langfuse client, variable extraction, template compilation
//!   - **tools**: `get-prompts` and `get-prompt` tool aliases
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use langfuse_prompts_mcp::core::{Config, McpServer};
//! use langfuse_prompts_mcp::domains::prompts::{LangfuseClient, PromptGateway};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     config.validate()?;
//!     let client = LangfuseClient::from_config(&config.langfuse)?;
//!     let gateway = Arc::new(PromptGateway::new(Arc::new(client)));
//!     let server = McpServer::new(Arc::new(config), gateway);
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
