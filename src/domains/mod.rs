//! Domains module containing business logic organized by bounded contexts.
//!
//! `prompts` talks to Langfuse and compiles templates; `tools` exposes the
//! same operations as MCP tools.

pub mod prompts;
pub mod tools;
