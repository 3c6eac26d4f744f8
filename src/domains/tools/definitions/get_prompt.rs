//! `get-prompt` tool definition.
//!
//! Tool-style alias of `prompts/get`: fetches and compiles one prompt.

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::{CallToolResult, JsonObject, Tool},
};
use schemars::JsonSchema;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

use super::common::{error_result, json_result, report_failure};
use crate::core::ClientLogLevel;
use crate::domains::prompts::{GatewayError, PromptGateway, arguments_from_json};

// ============================================================================
// Tool Parameters
// ============================================================================

/// Prompt variables, either as a JSON object or as a JSON-encoded string.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum PromptArguments {
    Object(JsonObject),
    Encoded(String),
}

impl PromptArguments {
    /// Resolve into template values.
    pub fn into_values(self) -> Result<HashMap<String, String>, GatewayError> {
        let object = match self {
            Self::Object(object) => object,
            Self::Encoded(raw) if raw.trim().is_empty() => JsonObject::new(),
            Self::Encoded(raw) => serde_json::from_str::<JsonObject>(&raw).map_err(|e| {
                GatewayError::invalid_arguments(format!("arguments must be a JSON object: {e}"))
            })?,
        };
        Ok(arguments_from_json(Some(object)))
    }
}

/// Parameters for the get-prompt tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetPromptParams {
    /// Name of the prompt to retrieve.
    #[schemars(description = "Name of the prompt to retrieve, use get-prompts to get a list of prompts")]
    pub name: String,

    /// Variables passed to the prompt template.
    #[schemars(
        description = "Arguments with prompt variables to pass to the prompt template, json object, e.g. {\"<name>\":\"<value>\"}"
    )]
    #[serde(default)]
    pub arguments: Option<PromptArguments>,
}

// ============================================================================
// Tool Definition
// ============================================================================

/// Fetches and compiles a prompt stored in Langfuse.
pub struct GetPromptTool;

impl GetPromptTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "get-prompt";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Get a prompt that is stored in Langfuse";

    /// Execute the tool logic.
    ///
    /// The compiled messages are returned as one JSON text block; failures
    /// become a flagged result.
    #[instrument(skip_all, fields(name = %params.name))]
    pub async fn execute(params: &GetPromptParams, gateway: &PromptGateway) -> CallToolResult {
        info!("get-prompt tool called for '{}'", params.name);

        let arguments = match params.arguments.clone().map(PromptArguments::into_values) {
            None => HashMap::new(),
            Some(Ok(values)) => values,
            Some(Err(e)) => return error_result(&e.to_string()),
        };

        match gateway.get_prompt(&params.name, arguments).await {
            Ok(result) => json_result(&result),
            Err(e) => error_result(&e.to_string()),
        }
    }

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        Tool {
            name: Self::NAME.into(),
            description: Some(Self::DESCRIPTION.into()),
            input_schema: cached_schema_for_type::<GetPromptParams>(),
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
                let params: GetPromptParams =
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
