//! Configuration management for the MCP server.
//!
//! Configuration is read from environment variables (optionally loaded from
//! a `.env` file) on top of built-in defaults, then validated once at
//! startup before any transport is started.

use super::error::{Error, Result};
use super::transport::TransportConfig;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default Langfuse endpoint.
pub const DEFAULT_LANGFUSE_BASE_URL: &str = "https://cloud.langfuse.com";

/// Default timeout for upstream requests, in seconds.
pub const DEFAULT_LANGFUSE_TIMEOUT_SECS: u64 = 30;

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Langfuse connection settings.
    pub langfuse: LangfuseConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,
}

/// Connection settings for the Langfuse prompts API.
#[derive(Clone, Serialize, Deserialize)]
pub struct LangfuseConfig {
    /// Project public key, used as the basic auth user name.
    pub public_key: Option<String>,

    /// Project secret key, used as the basic auth password.
    pub secret_key: Option<String>,

    /// Base URL of the Langfuse deployment.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for LangfuseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LangfuseConfig")
            .field("public_key", &self.public_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for LangfuseConfig {
    fn default() -> Self {
        Self {
            public_key: None,
            secret_key: None,
            base_url: DEFAULT_LANGFUSE_BASE_URL.to_string(),
            timeout_secs: DEFAULT_LANGFUSE_TIMEOUT_SECS,
        }
    }
}

impl LangfuseConfig {
    /// Both API keys, or a configuration error naming the missing one.
    pub fn credentials(&self) -> Result<(&str, &str)> {
        let public_key = self
            .public_key
            .as_deref()
            .ok_or_else(|| Error::config("LANGFUSE_PUBLIC_KEY is not set"))?;
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or_else(|| Error::config("LANGFUSE_SECRET_KEY is not set"))?;
        Ok((public_key, secret_key))
    }

    fn validate(&self) -> Result<()> {
        self.credentials()?;

        let url = Url::parse(&self.base_url)
            .map_err(|e| Error::config(format!("LANGFUSE_BASEURL '{}': {e}", self.base_url)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "LANGFUSE_BASEURL must be an http(s) URL, got '{}'",
                self.base_url
            )));
        }

        if self.timeout_secs == 0 {
            return Err(Error::config("LANGFUSE_TIMEOUT_SECS must be greater than 0"));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "langfuse-prompts".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            langfuse: LangfuseConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
            },
            transport: TransportConfig::default(),
        }
    }
}

/// Read a variable, treating empty values as unset.
pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Some(name) = env_var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Some(level) = env_var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }

        config.langfuse.public_key = env_var("LANGFUSE_PUBLIC_KEY");
        config.langfuse.secret_key = env_var("LANGFUSE_SECRET_KEY");

        if let Some(base_url) = env_var("LANGFUSE_BASEURL") {
            config.langfuse.base_url = base_url;
        }

        if let Some(timeout) = env_var("LANGFUSE_TIMEOUT_SECS") {
            match timeout.parse() {
                Ok(secs) => config.langfuse.timeout_secs = secs,
                Err(_) => warn!(
                    "Ignoring invalid LANGFUSE_TIMEOUT_SECS '{}', using {}s",
                    timeout, DEFAULT_LANGFUSE_TIMEOUT_SECS
                ),
            }
        }

        config.transport = TransportConfig::from_env();

        config
    }

    /// Check that the configuration can start a server.
    pub fn validate(&self) -> Result<()> {
        self.langfuse.validate()?;
        self.transport.validate()
    }
}

// Mutex to ensure env var tests run serially
#[cfg(test)]
pub(crate) static ENV_TEST_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());

#[cfg(test)]
mod tests {
    use super::*;

    const LANGFUSE_VARS: [&str; 4] = [
        "LANGFUSE_PUBLIC_KEY",
        "LANGFUSE_SECRET_KEY",
        "LANGFUSE_BASEURL",
        "LANGFUSE_TIMEOUT_SECS",
    ];

    fn clear_langfuse_env() {
        for var in LANGFUSE_VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    fn configured() -> Config {
        let mut config = Config::default();
        config.langfuse.public_key = Some("pk-lf-1".to_string());
        config.langfuse.secret_key = Some("sk-lf-1".to_string());
        config
    }

    #[test]
    fn test_langfuse_from_env() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_langfuse_env();
        unsafe {
            std::env::set_var("LANGFUSE_PUBLIC_KEY", "pk-lf-test");
            std::env::set_var("LANGFUSE_SECRET_KEY", "sk-lf-test");
            std::env::set_var("LANGFUSE_BASEURL", "https://langfuse.example.com");
            std::env::set_var("LANGFUSE_TIMEOUT_SECS", "5");
        }

        let config = Config::from_env();
        assert_eq!(config.langfuse.credentials().unwrap(), ("pk-lf-test", "sk-lf-test"));
        assert_eq!(config.langfuse.base_url, "https://langfuse.example.com");
        assert_eq!(config.langfuse.timeout_secs, 5);

        clear_langfuse_env();
    }

    #[test]
    fn test_langfuse_defaults() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_langfuse_env();
        unsafe {
            std::env::set_var("LANGFUSE_TIMEOUT_SECS", "soon");
        }

        let config = Config::from_env();
        assert_eq!(config.langfuse.base_url, DEFAULT_LANGFUSE_BASE_URL);
        assert_eq!(config.langfuse.timeout_secs, DEFAULT_LANGFUSE_TIMEOUT_SECS);
        assert!(config.langfuse.public_key.is_none());

        clear_langfuse_env();
    }

    #[test]
    fn test_empty_value_counts_as_unset() {
        let _lock = ENV_TEST_LOCK.lock().unwrap();
        clear_langfuse_env();
        unsafe {
            std::env::set_var("LANGFUSE_PUBLIC_KEY", "  ");
        }

        let config = Config::from_env();
        assert!(config.langfuse.public_key.is_none());

        clear_langfuse_env();
    }

    #[test]
    fn test_missing_credentials_fail_validation() {
        let config = Config::default();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LANGFUSE_PUBLIC_KEY"));

        let mut config = Config::default();
        config.langfuse.public_key = Some("pk".to_string());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("LANGFUSE_SECRET_KEY"));
    }

    #[test]
    fn test_validation() {
        assert!(configured().validate().is_ok());

        let mut config = configured();
        config.langfuse.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = configured();
        config.langfuse.base_url = "ftp://langfuse.example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = configured();
        config.langfuse.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secret_redacted_in_debug() {
        let config = configured();
        let debug_str = format!("{:?}", config);
        assert!(debug_str.contains("REDACTED"));
        assert!(debug_str.contains("pk-lf-1"));
        assert!(!debug_str.contains("sk-lf-1"));
    }
}
