//! Log messages sent to the MCP client.
//!
//! Separate from the server's own `tracing` output: these travel over the
//! protocol as `notifications/message` and are filtered by the level the
//! client picked with `logging/setLevel`.

use parking_lot::Mutex;
use rmcp::model::{LoggingLevel, LoggingMessageNotificationParam};
use serde_json::Value;
use std::sync::Arc;

/// Logger name attached to client log messages.
pub const LOGGER_NAME: &str = "langfuse-prompts";

fn severity(level: LoggingLevel) -> u8 {
    match level {
        LoggingLevel::Debug => 0,
        LoggingLevel::Info => 1,
        LoggingLevel::Notice => 2,
        LoggingLevel::Warning => 3,
        LoggingLevel::Error => 4,
        LoggingLevel::Critical => 5,
        LoggingLevel::Alert => 6,
        LoggingLevel::Emergency => 7,
    }
}

/// Minimum level the client wants to receive. Clones share the threshold.
#[derive(Debug, Clone)]
pub struct ClientLogLevel(Arc<Mutex<LoggingLevel>>);

impl Default for ClientLogLevel {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(LoggingLevel::Info)))
    }
}

impl ClientLogLevel {
    pub fn get(&self) -> LoggingLevel {
        *self.0.lock()
    }

    pub fn set(&self, level: LoggingLevel) {
        *self.0.lock() = level;
    }

    /// Whether a message at `level` passes the threshold.
    pub fn allows(&self, level: LoggingLevel) -> bool {
        severity(level) >= severity(self.get())
    }

    /// Build a log message, or `None` when `level` is filtered out.
    pub fn message(&self, level: LoggingLevel, data: Value) -> Option<LoggingMessageNotificationParam> {
        self.allows(level).then(|| LoggingMessageNotificationParam {
            level,
            logger: Some(LOGGER_NAME.to_string()),
            data,
        })
    }
}
