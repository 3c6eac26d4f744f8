//! Request dispatch for HTTP sessions.
//!
//! Mirrors what rmcp's `ServerHandler` routing does for stdio, on top of the
//! helper methods of [`McpServer`](crate::core::McpServer).

use rmcp::ErrorData as McpError;
use rmcp::model::{JsonObject, LoggingLevel};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{info, instrument, warn};

use super::transport::SessionTransport;
use crate::core::transport::jsonrpc::{
    JSONRPC_VERSION, JsonRpcError, JsonRpcRequest, JsonRpcResponse,
};
use crate::domains::tools::definitions::common::failure_data;

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    #[serde(default)]
    cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GetPromptParams {
    name: String,
    #[serde(default)]
    arguments: Option<JsonObject>,
}

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct SetLevelParams {
    level: LoggingLevel,
}

/// Parse request params; absent params parse as `null`.
fn params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, String> {
    serde_json::from_value(params.unwrap_or(Value::Null)).map_err(|e| e.to_string())
}

fn respond<T: serde::Serialize>(id: Value, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::internal_error(id, e.to_string()),
    }
}

fn error_response(id: Value, error: McpError) -> JsonRpcResponse {
    JsonRpcResponse {
        jsonrpc: JSONRPC_VERSION.to_string(),
        id,
        result: None,
        error: Some(JsonRpcError {
            code: error.code.0,
            message: error.message.to_string(),
            data: error.data,
        }),
    }
}

/// Route one request to the session's server.
#[instrument(skip_all, fields(method = %request.method))]
pub(super) async fn dispatch(transport: &SessionTransport, request: JsonRpcRequest) -> JsonRpcResponse {
    let JsonRpcRequest {
        id, method, params: raw, ..
    } = request;
    let server = transport.server();

    match method.as_str() {
        "ping" => JsonRpcResponse::success(id, json!({})),

        "prompts/list" => {
            info!("Processing prompts/list request");
            let parsed: ListParams = match raw {
                None | Some(Value::Null) => ListParams::default(),
                raw => match params(raw) {
                    Ok(parsed) => parsed,
                    Err(e) => return JsonRpcResponse::invalid_params(id, e),
                },
            };
            match server.prompts_page(parsed.cursor.as_deref()).await {
                Ok(result) => respond(id, &result),
                Err(e) => error_response(id, e.into()),
            }
        }

        "prompts/get" => {
            info!("Processing prompts/get request");
            let parsed: GetPromptParams = match params(raw) {
                Ok(parsed) => parsed,
                Err(e) => return JsonRpcResponse::invalid_params(id, e),
            };
            match server.compile_prompt(&parsed.name, parsed.arguments).await {
                Ok(result) => respond(id, &result),
                Err(e) => error_response(id, e.into()),
            }
        }

        "tools/list" => {
            info!("Processing tools/list request");
            JsonRpcResponse::success(id, json!({ "tools": server.tools() }))
        }

        "tools/call" => {
            let parsed: CallToolParams = match params(raw) {
                Ok(parsed) => parsed,
                Err(e) => return JsonRpcResponse::invalid_params(id, e),
            };
            info!("Processing tools/call request for '{}'", parsed.name);

            match server.invoke_tool(&parsed.name, parsed.arguments).await {
                Ok(result) => {
                    if let Some(data) = failure_data(&parsed.name, &result) {
                        transport.log(LoggingLevel::Error, data);
                    }
                    respond(id, &result)
                }
                Err(e) => JsonRpcResponse::invalid_params(id, e.to_string()),
            }
        }

        "logging/setLevel" => {
            let parsed: SetLevelParams = match params(raw) {
                Ok(parsed) => parsed,
                Err(e) => return JsonRpcResponse::invalid_params(id, e),
            };
            info!("Client log level set to {:?}", parsed.level);
            transport.set_log_level(parsed.level);
            JsonRpcResponse::success(id, json!({}))
        }

        _ => {
            warn!("Unknown method: {}", method);
            JsonRpcResponse::method_not_found(id, &method)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::server::test_server;
    use crate::domains::prompts::upstream::testing::StaticPromptSource;
    use std::sync::Arc;

    fn transport() -> Arc<SessionTransport> {
        SessionTransport::builder(test_server(
            StaticPromptSource::new()
                .with_text("greet", "Hello {{name}}")
                .with_total_pages(3),
        ))
        .build()
    }

    fn request(method: &str, params: Value) -> JsonRpcRequest {
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: json!(1),
            method: method.to_string(),
            params: Some(params),
        }
    }

    #[tokio::test]
    async fn test_ping() {
        let response = dispatch(&transport(), request("ping", Value::Null)).await;
        assert_eq!(response.result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_prompts_list_and_cursor() {
        let transport = transport();
        let response = dispatch(&transport, request("prompts/list", json!({}))).await;
        let result = response.result.unwrap();
        assert_eq!(result["prompts"][0]["name"], "greet");
        assert_eq!(result["prompts"][0]["arguments"][0]["name"], "name");
        assert_eq!(result["nextCursor"], "2");

        let response = dispatch(&transport, request("prompts/list", json!({ "cursor": "abc" }))).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(response.result.is_none());
    }

    #[tokio::test]
    async fn test_prompts_get() {
        let response = dispatch(
            &transport(),
            request("prompts/get", json!({ "name": "greet", "arguments": { "name": "Ada" } })),
        )
        .await;
        let result = response.result.unwrap();
        assert_eq!(result["messages"][0]["role"], "user");
        assert_eq!(result["messages"][0]["content"]["text"], "Hello Ada");

        let response =
            dispatch(&transport(), request("prompts/get", json!({ "name": "missing" }))).await;
        assert_eq!(response.error.unwrap().code, -32602);

        let response = dispatch(&transport(), request("prompts/get", json!({}))).await;
        assert_eq!(response.error.unwrap().code, -32602);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = dispatch(&transport(), request("tools/list", Value::Null)).await;
        let result = response.result.unwrap();
        assert_eq!(result["tools"][0]["name"], "get-prompts");
        assert_eq!(result["tools"][1]["name"], "get-prompt");
    }

    #[tokio::test]
    async fn test_failed_tool_call_is_logged_to_stream() {
        let transport = transport();
        let mut stream = transport.subscribe().unwrap();

        let response = dispatch(
            &transport,
            request("tools/call", json!({ "name": "get-prompt", "arguments": { "name": "missing" } })),
        )
        .await;
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);

        let message = stream.next().await.unwrap();
        assert_eq!(message["method"], "notifications/message");
        assert_eq!(message["params"]["level"], "error");
        assert_eq!(message["params"]["data"]["tool"], "get-prompt");
    }

    #[tokio::test]
    async fn test_unknown_tool_and_method() {
        let response = dispatch(
            &transport(),
            request("tools/call", json!({ "name": "nope", "arguments": {} })),
        )
        .await;
        assert_eq!(response.error.unwrap().code, -32602);

        let response = dispatch(&transport(), request("resources/list", json!({}))).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn test_set_level() {
        let response = dispatch(
            &transport(),
            request("logging/setLevel", json!({ "level": "warning" })),
        )
        .await;
        assert_eq!(response.result, Some(json!({})));

        let response =
            dispatch(&transport(), request("logging/setLevel", json!({ "level": "loud" }))).await;
        assert!(response.error.is_some());
    }
}
