//! JSON-RPC 2.0 message types used by the HTTP session transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version string carried by every message.
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC request structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Value,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// JSON-RPC notification structure (a request without id).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcNotification {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

impl JsonRpcNotification {
    /// Create a notification.
    pub fn new(method: impl Into<String>, params: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: method.into(),
            params: Some(params),
        }
    }
}

/// JSON-RPC response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcResponse {
    /// Create a success response.
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response.
    pub fn error(id: Value, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }

    /// Method not found error.
    pub fn method_not_found(id: Value, method: &str) -> Self {
        Self::error(id, -32601, format!("Method not found: {method}"))
    }

    /// Invalid request error.
    pub fn invalid_request(id: Value, msg: impl Into<String>) -> Self {
        Self::error(id, -32600, msg)
    }

    /// Invalid params error.
    pub fn invalid_params(id: Value, msg: impl Into<String>) -> Self {
        Self::error(id, -32602, msg)
    }

    /// Internal error.
    pub fn internal_error(id: Value, msg: impl Into<String>) -> Self {
        Self::error(id, -32603, msg)
    }
}

/// A client message, classified by shape.
#[derive(Debug, Clone)]
pub enum IncomingMessage {
    /// Carries a method and an id; expects a response.
    Request(JsonRpcRequest),
    /// Carries a method and no id.
    Notification(JsonRpcNotification),
    /// Answer to a server-initiated request.
    Response(Value),
}

impl IncomingMessage {
    /// Classify a JSON value, or explain why it is not a JSON-RPC message.
    pub fn parse(value: Value) -> Result<Self, String> {
        let Some(object) = value.as_object() else {
            return Err("message must be a JSON object".to_string());
        };
        if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
            return Err("jsonrpc must be \"2.0\"".to_string());
        }

        let has_id = object.get("id").is_some_and(|id| !id.is_null());
        if object.contains_key("method") {
            if has_id {
                serde_json::from_value(value)
                    .map(Self::Request)
                    .map_err(|e| e.to_string())
            } else {
                serde_json::from_value(value)
                    .map(Self::Notification)
                    .map_err(|e| e.to_string())
            }
        } else if has_id && (object.contains_key("result") || object.contains_key("error")) {
            Ok(Self::Response(value))
        } else {
            Err("message is neither a request, a notification nor a response".to_string())
        }
    }

    /// Method name, for requests and notifications.
    pub fn method(&self) -> Option<&str> {
        match self {
            Self::Request(request) => Some(&request.method),
            Self::Notification(notification) => Some(&notification.method),
            Self::Response(_) => None,
        }
    }
}

/// Whether a raw body is a well-formed `initialize` request.
///
/// Requires an id, a string `protocolVersion`, a `capabilities` object and
/// a `clientInfo` with string `name` and `version`.
pub fn is_initialize_request(value: &Value) -> bool {
    if value.get("method").and_then(Value::as_str) != Some("initialize") {
        return false;
    }
    if value.get("id").is_none_or(Value::is_null) {
        return false;
    }
    let Some(params) = value.get("params") else {
        return false;
    };
    let client_info = params.get("clientInfo");

    params.get("protocolVersion").is_some_and(Value::is_string)
        && params.get("capabilities").is_some_and(Value::is_object)
        && client_info
            .and_then(|c| c.get("name"))
            .is_some_and(Value::is_string)
        && client_info
            .and_then(|c| c.get("version"))
            .is_some_and(Value::is_string)
}
