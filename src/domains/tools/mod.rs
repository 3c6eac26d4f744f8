//! Tools domain module.
//!
//! Tool-style aliases of the prompt operations, for MCP clients that only
//! understand tools.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual tool implementations (one file per tool)
//! - `router.rs` - ToolRouter builder used by the rmcp server handler
//! - `registry.rs` - Tool metadata and direct dispatch for HTTP sessions
//! - `error.rs` - Tool-specific error types

pub mod definitions;
mod error;
mod registry;
pub mod router;

pub use error::ToolError;
pub use registry::ToolRegistry;
pub use router::build_tool_router;
