//! Result helpers shared by the prompt tools.

use rmcp::model::{CallToolResult, Content, LoggingLevel, RawContent};
use rmcp::{Peer, RoleServer};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::core::ClientLogLevel;

/// Create an error result; the message is prefixed with `Error: `.
pub fn error_result(message: &str) -> CallToolResult {
    warn!("{}", message);
    CallToolResult::error(vec![Content::text(format!("Error: {message}"))])
}

/// Create a success result carrying `value` serialized as one JSON text block.
pub fn json_result<T: Serialize>(value: &T) -> CallToolResult {
    match serde_json::to_string(value) {
        Ok(text) => CallToolResult::success(vec![Content::text(text)]),
        Err(e) => error_result(&format!("Failed to serialize result: {e}")),
    }
}

/// Log payload describing a failed tool call, or `None` for a success.
pub fn failure_data(tool: &str, result: &CallToolResult) -> Option<Value> {
    if result.is_error != Some(true) {
        return None;
    }
    let error = result
        .content
        .iter()
        .find_map(|c| match &c.raw {
            RawContent::Text(text) => Some(text.text.clone()),
            _ => None,
        })
        .unwrap_or_default();
    Some(json!({ "tool": tool, "error": error }))
}

/// Send an `error` log message to the client when `result` is a failure.
pub async fn report_failure(
    peer: &Peer<RoleServer>,
    level: &ClientLogLevel,
    tool: &str,
    result: &CallToolResult,
) {
    let Some(message) =
        failure_data(tool, result).and_then(|data| level.message(LoggingLevel::Error, data))
    else {
        return;
    };
    if let Err(e) = peer.notify_logging_message(message).await {
        debug!("Failed to send log message for {}: {}", tool, e);
    }
}
