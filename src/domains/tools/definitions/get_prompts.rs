//! `get-prompts` tool definition.
//!
//! Tool-style alias of `prompts/list` for clients that only speak tools.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use super::common::{error_result, json_result, report_failure};
use crate::core::ClientLogLevel;
use crate::domains::prompts::PromptGateway;

// ============================================================================
// Tool Parameters
// ============================================================================

/// Parameters for the get-prompts tool.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetPromptsParams {
    /// Cursor to paginate through prompts.
    #[schemars(description = "Cursor to paginate through prompts")]
    #[serde(default)]
    pub cursor: Option<String>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Lists prompts stored in Langfuse.
pub struct GetPromptsTool;

impl GetPromptsTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get-prompts";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get prompts that are stored in Langfuse";

    /// Execute the tool logic.
    ///
    /// The whole listing (prompts and next cursor) is returned as one JSON
    /// text block; failures become a flagged result.
    #[instrument(skip_all, fields(cursor = ?params.cursor))]
    pub async fn execute(params: &GetPromptsParams, gateway: &PromptGateway) -> CallToolResult {
        info!("get-prompts tool called");

        match gateway.list_prompts(params.cursor.as_deref()).await {
            Ok(result) => json_result(&result),
            Err(e) => error_result(&e.to_string()),
        }
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<GetPromptsParams>(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Create a ToolRoute for the rmcp tool router.
    ///
    /// Failures are also reported to the client as an `error` log message.
    pub fn create_route<S>(gateway: Arc<PromptGateway>, log_level: ClientLogLevel) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        ToolRoute::new_dyn(Self::to_tool(), move |ctx: ToolCallContext<'_, S>| {
            let args = ctx.arguments.clone().unwrap_or_default();
            let peer = ctx.request_context.peer.clone();
            let gateway = gateway.clone();
            let log_level = log_level.clone();
            async move {
                let params: GetPromptsParams =
                    serde_json::from_value(serde_json::Value::Object(args))
                        .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

                let result = Self::execute(&params, &gateway).await;
                report_failure(&peer, &log_level, Self::NAME, &result).await;
                Ok(result)
            }
            .boxed()
        })
    }
}
