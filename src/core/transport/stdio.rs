//! STDIO transport implementation.
//!
//! Standard input/output transport for MCP - the default mode. One
//! `McpServer` serves the single client on the other end of the pipe.

use rmcp::ServiceExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Run the STDIO transport until the client disconnects.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        info!("Ready - communicating via stdin/stdout");
        Self::serve(server, tokio::io::stdin(), tokio::io::stdout()).await?;
        info!("STDIO transport finished");
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC over any reader/writer pair.
    pub async fn serve<R, W>(server: McpServer, reader: R, writer: W) -> TransportResult<()>
    where
        R: AsyncRead + Send + Unpin + 'static,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let service = server
            .serve((reader, writer))
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        service
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;
        Ok(())
    }
}
