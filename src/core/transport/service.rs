//! Transport service - starts the configured transport.

use std::sync::Arc;
use tracing::info;

use super::{TransportConfig, TransportResult};
use crate::core::config::Config;
use crate::domains::prompts::PromptGateway;

#[cfg(feature = "stdio")]
use super::stdio::StdioTransport;
#[cfg(feature = "stdio")]
use crate::core::McpServer;

#[cfg(feature = "http")]
use super::http::HttpTransport;

/// Transport service - manages the transport layer for the MCP server.
pub struct TransportService {
    config: TransportConfig,
}

impl TransportService {
    /// Create a new transport service with the given configuration.
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }

    /// Get the transport configuration.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Log information about the configured transport.
    pub fn log_info(&self) {
        info!("Starting transport: {}", self.config.description());
    }

    /// Start the transport.
    ///
    /// STDIO serves a single server; HTTP builds one server per session
    /// from the shared configuration and gateway. Blocks until shutdown.
    pub async fn run(self, config: Arc<Config>, gateway: Arc<PromptGateway>) -> TransportResult<()> {
        self.log_info();

        match self.config {
            #[cfg(feature = "stdio")]
            TransportConfig::Stdio => StdioTransport::run(McpServer::new(config, gateway)).await,
            #[cfg(feature = "http")]
            TransportConfig::Http(cfg) => HttpTransport::new(cfg).run(config, gateway).await,
        }
    }
}
