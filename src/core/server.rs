//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the prompt gateway and the tool registry.
//!
//! The stdio transport drives it through rmcp's `ServerHandler`; HTTP
//! sessions call the helper methods below directly.

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, handler::server::tool::ToolRouter, model::*,
    service::RequestContext, tool_handler,
};
use std::sync::Arc;
use tracing::{info, instrument};

use super::client_log::ClientLogLevel;
use super::config::Config;
use crate::domains::{
    prompts::{GatewayError, PromptGateway, arguments_from_json},
    tools::{ToolError, ToolRegistry, build_tool_router},
};

const INSTRUCTIONS: &str = "Exposes prompts stored in Langfuse. Use prompts/list or the \
get-prompts tool to discover prompts and their variables, then prompts/get or the get-prompt \
tool to retrieve a prompt compiled with your arguments.";

/// The main MCP server handler.
///
/// Cheap to clone; every clone shares the same gateway.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Gateway to the upstream prompt service.
    gateway: Arc<PromptGateway>,

    /// Tool metadata and direct dispatch.
    tool_registry: Arc<ToolRegistry>,

    /// Minimum level of log messages sent to the client.
    log_level: ClientLogLevel,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server over the given prompt gateway.
    pub fn new(config: Arc<Config>, gateway: Arc<PromptGateway>) -> Self {
        let log_level = ClientLogLevel::default();
        Self {
            tool_router: build_tool_router::<Self>(gateway.clone(), log_level.clone()),
            log_level,
            tool_registry: Arc::new(ToolRegistry::new(gateway.clone())),
            config,
            gateway,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// Threshold set by the client through `logging/setLevel`.
    pub fn log_level(&self) -> &ClientLogLevel {
        &self.log_level
    }

    // ========================================================================
    // Session Transport Support Methods
    // ========================================================================

    /// List one page of prompts.
    pub async fn prompts_page(
        &self,
        cursor: Option<&str>,
    ) -> Result<ListPromptsResult, GatewayError> {
        self.gateway.list_prompts(cursor).await
    }

    /// Fetch and compile a prompt.
    pub async fn compile_prompt(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<GetPromptResult, GatewayError> {
        self.gateway
            .get_prompt(name, arguments_from_json(arguments))
            .await
    }

    /// All tools, in listing order.
    pub fn tools(&self) -> Vec<Tool> {
        ToolRegistry::get_all_tools()
    }

    /// Call a tool by name.
    pub async fn invoke_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ToolError> {
        self.tool_registry.call_tool(name, arguments).await
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_logging()
                .enable_prompts()
                .enable_tools()
                .build(),
            server_info: Implementation {
                name: self.name().to_string(),
                version: self.version().to_string(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn set_level(
        &self,
        request: SetLevelRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<(), McpError> {
        info!("Client log level set to {:?}", request.level);
        self.log_level.set(request.level);
        Ok(())
    }

    #[instrument(skip(self, _context))]
    async fn list_prompts(
        &self,
        request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListPromptsResult, McpError> {
        info!("Listing prompts");
        let cursor = request.and_then(|r| r.cursor);
        self.prompts_page(cursor.as_deref())
            .await
            .map_err(McpError::from)
    }

    #[instrument(skip(self, _context))]
    async fn get_prompt(
        &self,
        request: GetPromptRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<GetPromptResult, McpError> {
        info!("Getting prompt: {}", request.name);
        self.compile_prompt(&request.name, request.arguments)
            .await
            .map_err(McpError::from)
    }
}

/// Server over a fixed prompt source, for tests.
#[cfg(test)]
pub(crate) fn test_server(
    source: crate::domains::prompts::upstream::testing::StaticPromptSource,
) -> McpServer {
    McpServer::new(
        Arc::new(Config::default()),
        Arc::new(PromptGateway::new(Arc::new(source))),
    )
}
