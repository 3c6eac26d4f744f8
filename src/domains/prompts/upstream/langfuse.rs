//! Langfuse public API client.
//!
//! Talks to `/api/public/v2/prompts` using HTTP basic auth with the
//! project's public key as user name and secret key as password.

use async_trait::async_trait;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use reqwest::{RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument};

use super::{
    FetchOptions, FetchedPrompt, ListPromptsQuery, PRODUCTION_LABEL, PromptPage, PromptSource,
    UpstreamError,
};
use crate::core::config::LangfuseConfig;

/// Path segments of the prompts API below the base URL.
const PROMPTS_PATH: [&str; 4] = ["api", "public", "v2", "prompts"];

/// HTTP client for the Langfuse prompts API.
#[derive(Clone)]
pub struct LangfuseClient {
    http: reqwest::Client,
    base_url: Url,
    public_key: String,
    secret_key: String,
}

impl std::fmt::Debug for LangfuseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LangfuseClient")
            .field("base_url", &self.base_url.as_str())
            .field("public_key", &self.public_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

impl LangfuseClient {
    /// Create a client for the given base URL and credentials.
    pub fn new(
        base_url: &str,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let base_url =
            Url::parse(base_url).map_err(|e| UpstreamError::InvalidUrl(format!("{base_url}: {e}")))?;
        if base_url.cannot_be_a_base() {
            return Err(UpstreamError::InvalidUrl(base_url.to_string()));
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("langfuse-prompts-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::Client)?;

        Ok(Self {
            http,
            base_url,
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        })
    }

    /// Create a client from the Langfuse configuration section.
    pub fn from_config(config: &LangfuseConfig) -> crate::Result<Self> {
        let (public_key, secret_key) = config.credentials()?;
        let client = Self::new(
            &config.base_url,
            public_key,
            secret_key,
            Duration::from_secs(config.timeout_secs),
        )?;
        Ok(client)
    }

    /// Build a prompts endpoint URL, percent-encoding each extra segment.
    fn endpoint(&self, extra: &[&str]) -> Result<Url, UpstreamError> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| UpstreamError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty().extend(PROMPTS_PATH).extend(extra);
        }
        Ok(url)
    }

    /// Send an authenticated request and decode a JSON response.
    async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        url: &Url,
    ) -> Result<T, UpstreamError> {
        let response = request
            .basic_auth(&self.public_key, Some(&self.secret_key))
            .send()
            .await
            .map_err(|source| UpstreamError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::status(url.as_str(), status.as_u16(), body));
        }

        response
            .json::<T>()
            .await
            .map_err(|source| UpstreamError::Decode {
                url: url.to_string(),
                source,
            })
    }
}

#[async_trait]
impl PromptSource for LangfuseClient {
    #[instrument(skip(self), fields(page = query.page))]
    async fn list_prompts(&self, query: &ListPromptsQuery) -> Result<PromptPage, UpstreamError> {
        let url = self.endpoint(&[])?;
        debug!("Listing prompts from {}", url);

        let request = self.http.get(url.clone()).query(query);
        self.send_json(request, &url).await
    }

    #[instrument(skip(self, options), fields(kind = ?options.kind))]
    async fn fetch_prompt(
        &self,
        name: &str,
        options: &FetchOptions,
    ) -> Result<FetchedPrompt, UpstreamError> {
        let url = self.endpoint(&[name])?;
        let label = options.label.as_deref().unwrap_or(PRODUCTION_LABEL);
        debug!("Fetching prompt from {} (label {})", url, label);

        let mut request = self.http.get(url.clone()).query(&[("label", label)]);
        if options.bypass_cache {
            request = request.header(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
        }

        let prompt: FetchedPrompt = self.send_json(request, &url).await?;
        prompt.ensure_kind(options.kind)
    }
}
