//! Tool Registry - central registration and dispatch for all tools.
//!
//! The stdio transport goes through the rmcp router; the HTTP session
//! dispatcher calls tools through `call_tool` directly.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Tool};
use serde_json::Value;
use tracing::warn;

use crate::domains::prompts::PromptGateway;

use super::definitions::{GetPromptParams, GetPromptTool, GetPromptsParams, GetPromptsTool};
use super::error::ToolError;

// ============================================================================
// Tool Registry
// ============================================================================

/// Tool registry - manages all available tools.
pub struct ToolRegistry {
    gateway: Arc<PromptGateway>,
}

impl ToolRegistry {
    /// Create a new tool registry.
    pub fn new(gateway: Arc<PromptGateway>) -> Self {
        Self { gateway }
    }

    /// Get all tool names.
    pub fn tool_names(&self) -> Vec<&'static str> {
        vec![GetPromptsTool::NAME, GetPromptTool::NAME]
    }

    /// Get all tools as Tool models (metadata).
    ///
    /// Both transports list tools from here, so the order is stable.
    pub fn get_all_tools() -> Vec<Tool> {
        vec![GetPromptsTool::to_tool(), GetPromptTool::to_tool()]
    }

    /// Dispatch a tool call to the matching definition.
    ///
    /// `null` arguments are treated as an empty object.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Value,
    ) -> Result<CallToolResult, ToolError> {
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other,
        };

        match name {
            GetPromptsTool::NAME => {
                let params: GetPromptsParams = serde_json::from_value(arguments)
                    .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;
                Ok(GetPromptsTool::execute(&params, &self.gateway).await)
            }
            GetPromptTool::NAME => {
                let params: GetPromptParams = serde_json::from_value(arguments)
                    .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;
                Ok(GetPromptTool::execute(&params, &self.gateway).await)
            }
            _ => {
                warn!("Unknown tool requested: {}", name);
                Err(ToolError::not_found(name))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::prompts::upstream::testing::StaticPromptSource;

    fn registry() -> ToolRegistry {
        ToolRegistry::new(Arc::new(PromptGateway::new(Arc::new(
            StaticPromptSource::new().with_text("greet", "Hi {{name}}"),
        ))))
    }

    #[test]
    fn test_registry_tool_names() {
        let names = registry().tool_names();
        assert_eq!(names, vec!["get-prompts", "get-prompt"]);
    }

    #[test]
    fn test_get_all_tools_have_schemas() {
        let tools = ToolRegistry::get_all_tools();
        assert_eq!(tools.len(), 2);
        let get_prompt = &tools[1];
        let properties = get_prompt.input_schema.get("properties").unwrap();
        assert!(properties.get("name").is_some());
        assert!(properties.get("arguments").is_some());
    }

    #[tokio::test]
    async fn test_call_get_prompts_with_null_arguments() {
        let result = registry()
            .call_tool("get-prompts", Value::Null)
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_call_get_prompt() {
        let result = registry()
            .call_tool(
                "get-prompt",
                serde_json::json!({ "name": "greet", "arguments": { "name": "Ada" } }),
            )
            .await
            .unwrap();
        assert_ne!(result.is_error, Some(true));
    }

    #[tokio::test]
    async fn test_call_get_prompt_missing_name() {
        let err = registry()
            .call_tool("get-prompt", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_call_unknown() {
        let err = registry()
            .call_tool("unknown", serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "unknown"));
    }
}
