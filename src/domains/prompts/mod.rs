//! Prompts domain module.
//!
//! This module exposes prompt templates stored in Langfuse. Prompts are not
//! defined locally: they are listed and fetched from the upstream service on
//! every request and compiled with caller-supplied arguments.
//!
//! ## Architecture
//!
//! - `upstream/` - Prompt source trait and the Langfuse HTTP client
//! - `gateway.rs` - Listing, fetching and chat/text resolution
//! - `templates.rs` - `{{variable}}` substitution
//! - `variables.rs` - Variable extraction for prompt arguments

mod error;
mod gateway;
pub mod templates;
pub mod upstream;
pub mod variables;

pub use error::GatewayError;
pub use gateway::{PromptGateway, ResolutionAttempt, arguments_from_json};
pub use upstream::{LangfuseClient, PromptSource, UpstreamError};
pub use variables::{extract_variables, is_valid_variable_name};
