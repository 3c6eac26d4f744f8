//! MCP Server Entry Point
//!
//! Initializes logging, loads configuration, connects the Langfuse client
//! and starts the server with the configured transport.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use langfuse_prompts_mcp::core::{Config, TransportConfig, TransportService};
use langfuse_prompts_mcp::domains::prompts::{LangfuseClient, PromptGateway};

/// MCP server exposing prompts stored in Langfuse.
#[derive(Debug, Parser)]
#[command(name = "langfuse-prompts-mcp", version, about)]
struct Cli {
    /// Transport to serve on (overrides MCP_TRANSPORT).
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// HTTP port (overrides MCP_HTTP_PORT and PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TransportKind {
    Stdio,
    Http,
}

impl TransportKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Stdio => "stdio",
            Self::Http => "http",
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration from environment
    let mut config = Config::from_env();

    init_logging(&config.logging.level);

    if let Some(kind) = cli.transport {
        config.transport = TransportConfig::select(kind.as_str());
    }
    if let Some(port) = cli.port {
        config.transport = config.transport.with_port(port);
    }

    if let Err(e) = run(config).await {
        error!("Fatal error: {}", e);
        return Err(e.into());
    }
    Ok(())
}

async fn run(config: Config) -> langfuse_prompts_mcp::Result<()> {
    config.validate()?;

    info!("Starting {} v{}", config.server.name, config.server.version);
    info!("Langfuse endpoint: {}", config.langfuse.base_url);

    let client = LangfuseClient::from_config(&config.langfuse)?;
    let gateway = Arc::new(PromptGateway::new(Arc::new(client)));

    info!("Server initialized");

    let config = Arc::new(config);
    let transport = TransportService::new(config.transport.clone());
    transport.run(config, gateway).await?;

    info!("Server shutting down");
    Ok(())
}

/// Initialize the logging subsystem.
///
/// `RUST_LOG` wins over the configured level. Output goes to stderr since
/// stdout carries the STDIO protocol.
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level.to_lowercase()))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .init();
}
