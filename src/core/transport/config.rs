//! Transport configuration types.

use serde::{Deserialize, Serialize};

#[cfg(feature = "http")]
use crate::core::config::env_var;
use crate::core::error::Result;
#[cfg(feature = "http")]
use crate::core::error::Error;

/// Transport configuration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// Standard input/output transport (default for MCP).
    #[cfg(feature = "stdio")]
    Stdio,

    /// Session-based HTTP transport.
    #[cfg(feature = "http")]
    Http(HttpConfig),
}

/// HTTP transport configuration.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Port number to listen on.
    pub port: u16,

    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Path for the MCP endpoint.
    #[serde(default = "default_rpc_path")]
    pub rpc_path: String,

    /// Enable CORS for browser clients.
    #[serde(default = "default_cors")]
    pub enable_cors: bool,

    /// Maximum number of live sessions.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Sessions idle for longer than this are closed.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

#[cfg(feature = "http")]
const DEFAULT_HTTP_PORT: u16 = 8000;

#[cfg(feature = "http")]
fn default_host() -> String {
    "127.0.0.1".to_string()
}

#[cfg(feature = "http")]
fn default_rpc_path() -> String {
    "/mcp".to_string()
}

#[cfg(feature = "http")]
fn default_cors() -> bool {
    true
}

#[cfg(feature = "http")]
fn default_max_sessions() -> usize {
    1024
}

#[cfg(feature = "http")]
fn default_session_idle_secs() -> u64 {
    30 * 60
}

impl Default for TransportConfig {
    fn default() -> Self {
        #[cfg(feature = "stdio")]
        {
            Self::Stdio
        }

        #[cfg(all(not(feature = "stdio"), feature = "http"))]
        {
            Self::Http(HttpConfig::default())
        }

        #[cfg(not(any(feature = "stdio", feature = "http")))]
        {
            compile_error!("At least one transport feature must be enabled: stdio or http");
        }
    }
}

#[cfg(feature = "http")]
impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            host: default_host(),
            rpc_path: default_rpc_path(),
            enable_cors: default_cors(),
            max_sessions: default_max_sessions(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

#[cfg(feature = "http")]
impl HttpConfig {
    /// Load HTTP settings from environment variables.
    ///
    /// The port comes from `MCP_HTTP_PORT`, then `PORT`.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let port = env_var("MCP_HTTP_PORT")
            .or_else(|| env_var("PORT"))
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);
        let host = env_var("MCP_HTTP_HOST").unwrap_or(defaults.host);
        let rpc_path = env_var("MCP_HTTP_PATH").unwrap_or(defaults.rpc_path);
        let enable_cors = env_var("MCP_HTTP_CORS")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(defaults.enable_cors);
        let max_sessions = env_var("MCP_HTTP_MAX_SESSIONS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_sessions);
        let session_idle_secs = env_var("MCP_HTTP_SESSION_IDLE_SECS")
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.session_idle_secs);

        Self {
            port,
            host,
            rpc_path,
            enable_cors,
            max_sessions,
            session_idle_secs,
        }
    }

    /// Bind address in `host:port` form.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> Result<()> {
        if !self.rpc_path.starts_with('/') {
            return Err(Error::config(format!(
                "MCP_HTTP_PATH must start with '/', got '{}'",
                self.rpc_path
            )));
        }
        if self.max_sessions == 0 {
            return Err(Error::config("MCP_HTTP_MAX_SESSIONS must be greater than 0"));
        }
        if self.session_idle_secs == 0 {
            return Err(Error::config(
                "MCP_HTTP_SESSION_IDLE_SECS must be greater than 0",
            ));
        }
        Ok(())
    }
}

impl TransportConfig {
    /// Create a STDIO transport config.
    #[cfg(feature = "stdio")]
    pub fn stdio() -> Self {
        Self::Stdio
    }

    /// Create an HTTP transport config.
    #[cfg(feature = "http")]
    pub fn http(port: u16, host: impl Into<String>) -> Self {
        Self::Http(HttpConfig {
            port,
            host: host.into(),
            ..Default::default()
        })
    }

    /// Load transport config from environment variables.
    pub fn from_env() -> Self {
        let transport = std::env::var("MCP_TRANSPORT").unwrap_or_default();
        Self::select(&transport)
    }

    /// Pick a transport by name, reading its settings from the environment.
    ///
    /// Unknown names fall back to the default transport.
    pub fn select(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            #[cfg(feature = "http")]
            "http" => Self::Http(HttpConfig::from_env()),
            #[cfg(feature = "stdio")]
            _ => Self::Stdio,
            #[cfg(not(feature = "stdio"))]
            _ => Self::default(),
        }
    }

    /// Override the listening port; no effect on STDIO.
    pub fn with_port(self, port: u16) -> Self {
        match self {
            #[cfg(feature = "http")]
            Self::Http(cfg) => Self::Http(HttpConfig { port, ..cfg }),
            #[allow(unreachable_patterns)]
            other => {
                let _ = port;
                other
            }
        }
    }

    /// Get a description of this transport for logging.
    pub fn description(&self) -> String {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => "STDIO (standard MCP mode)".to_string(),
            #[cfg(feature = "http")]
            Self::Http(cfg) => format!("HTTP on {}{}", cfg.address(), cfg.rpc_path),
        }
    }

    /// Check if this transport is the standard STDIO mode.
    pub fn is_stdio(&self) -> bool {
        #[cfg(feature = "stdio")]
        {
            matches!(self, Self::Stdio)
        }
        #[cfg(not(feature = "stdio"))]
        {
            false
        }
    }

    /// Check the transport settings.
    pub fn validate(&self) -> Result<()> {
        match self {
            #[cfg(feature = "stdio")]
            Self::Stdio => Ok(()),
            #[cfg(feature = "http")]
            Self::Http(cfg) => cfg.validate(),
        }
    }
}
