//! Tool Router - builds the rmcp ToolRouter for the stdio transport.
//!
//! Each tool knows how to create its own route; this module only wires them
//! to the shared prompt gateway and the client's log threshold.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use crate::core::ClientLogLevel;
use crate::domains::prompts::PromptGateway;

use super::definitions::{GetPromptTool, GetPromptsTool};

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(gateway: Arc<PromptGateway>, log_level: ClientLogLevel) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(GetPromptsTool::create_route(gateway.clone(), log_level.clone()))
        .with_route(GetPromptTool::create_route(gateway, log_level))
}
