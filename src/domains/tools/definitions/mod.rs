//! Tool definitions module.
//!
//! Each tool is a thin alias over the prompt gateway, defined in its own
//! file with its parameters, `execute()` logic and rmcp route.

pub mod common;
pub mod get_prompt;
pub mod get_prompts;

pub use get_prompt::{GetPromptParams, GetPromptTool, PromptArguments};
pub use get_prompts::{GetPromptsParams, GetPromptsTool};
