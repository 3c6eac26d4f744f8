//! Upstream prompt-management service.
//!
//! The [`PromptSource`] trait is the seam between the prompt gateway and the
//! hosted service. [`LangfuseClient`] implements it over the Langfuse public
//! API; tests substitute an in-memory source.

mod error;
mod langfuse;

pub use error::UpstreamError;
pub use langfuse::LangfuseClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Label marking the deployed version of a prompt.
pub const PRODUCTION_LABEL: &str = "production";

/// Number of prompts requested per listing page.
pub const PAGE_SIZE: u32 = 100;

/// Prompt type discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptKind {
    /// Structured list of role-tagged messages.
    Chat,
    /// Single flat template string.
    Text,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => f.write_str("chat"),
            Self::Text => f.write_str("text"),
        }
    }
}

/// Query parameters for the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListPromptsQuery {
    pub label: String,
    pub page: u32,
    pub limit: u32,
}

impl ListPromptsQuery {
    /// Page `page` of the production-labelled prompts.
    pub fn production(page: u32) -> Self {
        Self {
            label: PRODUCTION_LABEL.to_string(),
            page,
            limit: PAGE_SIZE,
        }
    }
}

/// Summary entry returned by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptSummary {
    pub name: String,
}

/// Pagination metadata of a listing page. Only the page count drives paging.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub total_pages: u32,
}

/// One page of prompt summaries.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptPage {
    pub data: Vec<PromptSummary>,
    pub meta: PageMeta,
}

/// Options for fetching a single prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Label to resolve; the service defaults to `production`.
    pub label: Option<String>,
    /// Required prompt type, if any.
    pub kind: Option<PromptKind>,
    /// Ask intermediaries not to serve a cached copy.
    pub bypass_cache: bool,
}

/// A role-tagged chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// An entry of a chat prompt: either a message or a message-list placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatEntry {
    Message(ChatMessage),
    Placeholder { name: String },
}

/// Prompt body, discriminated by the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptBody {
    Chat { prompt: Vec<ChatEntry> },
    Text { prompt: String },
}

/// A prompt as returned by the fetch endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct FetchedPrompt {
    pub name: String,
    #[serde(default)]
    pub version: u32,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(flatten)]
    pub body: PromptBody,
}

impl FetchedPrompt {
    /// Build a chat prompt.
    pub fn chat(name: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            labels: vec![PRODUCTION_LABEL.to_string()],
            body: PromptBody::Chat {
                prompt: messages.into_iter().map(ChatEntry::Message).collect(),
            },
        }
    }

    /// Build a text prompt.
    pub fn text(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: 1,
            labels: vec![PRODUCTION_LABEL.to_string()],
            body: PromptBody::Text {
                prompt: template.into(),
            },
        }
    }

    /// The prompt's type.
    pub fn kind(&self) -> PromptKind {
        match self.body {
            PromptBody::Chat { .. } => PromptKind::Chat,
            PromptBody::Text { .. } => PromptKind::Text,
        }
    }

    /// The raw template serialized as JSON, as used for variable extraction.
    pub fn template_json(&self) -> String {
        let serialized = match &self.body {
            PromptBody::Chat { prompt } => serde_json::to_string(prompt),
            PromptBody::Text { prompt } => serde_json::to_string(prompt),
        };
        serialized.unwrap_or_default()
    }

    /// Fail with [`UpstreamError::TypeMismatch`] unless the prompt has the expected type.
    pub fn ensure_kind(self, expected: Option<PromptKind>) -> Result<Self, UpstreamError> {
        match expected {
            Some(expected) if expected != self.kind() => Err(UpstreamError::TypeMismatch {
                actual: self.kind(),
                name: self.name,
                expected,
            }),
            _ => Ok(self),
        }
    }
}

/// Access to stored prompts.
#[async_trait]
pub trait PromptSource: Send + Sync {
    /// List one page of prompts.
    async fn list_prompts(&self, query: &ListPromptsQuery) -> Result<PromptPage, UpstreamError>;

    /// Fetch a single prompt by name.
    async fn fetch_prompt(
        &self,
        name: &str,
        options: &FetchOptions,
    ) -> Result<FetchedPrompt, UpstreamError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory prompt source for tests.

    use super::*;
    use parking_lot::Mutex;

    /// Serves a fixed set of prompts and records every call.
    #[derive(Default)]
    pub struct StaticPromptSource {
        prompts: Vec<FetchedPrompt>,
        total_pages: Option<u32>,
        fail_listing: bool,
        pub list_calls: Mutex<Vec<ListPromptsQuery>>,
        pub fetch_calls: Mutex<Vec<(String, FetchOptions)>>,
    }

    impl StaticPromptSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_prompt(mut self, prompt: FetchedPrompt) -> Self {
            self.prompts.push(prompt);
            self
        }

        pub fn with_chat(self, name: &str, messages: &[(&str, &str)]) -> Self {
            let messages = messages
                .iter()
                .map(|(role, content)| ChatMessage {
                    role: role.to_string(),
                    content: content.to_string(),
                })
                .collect();
            self.with_prompt(FetchedPrompt::chat(name, messages))
        }

        pub fn with_text(self, name: &str, template: &str) -> Self {
            self.with_prompt(FetchedPrompt::text(name, template))
        }

        pub fn with_total_pages(mut self, total_pages: u32) -> Self {
            self.total_pages = Some(total_pages);
            self
        }

        pub fn failing_listing(mut self) -> Self {
            self.fail_listing = true;
            self
        }

        pub fn fetched_kinds(&self) -> Vec<Option<PromptKind>> {
            self.fetch_calls.lock().iter().map(|(_, o)| o.kind).collect()
        }
    }

    #[async_trait]
    impl PromptSource for StaticPromptSource {
        async fn list_prompts(
            &self,
            query: &ListPromptsQuery,
        ) -> Result<PromptPage, UpstreamError> {
            self.list_calls.lock().push(query.clone());
            if self.fail_listing {
                return Err(UpstreamError::status("memory://prompts", 500, "boom"));
            }

            let limit = query.limit.max(1) as usize;
            let start = (query.page.saturating_sub(1) as usize) * limit;
            let data = self
                .prompts
                .iter()
                .skip(start)
                .take(limit)
                .map(|p| PromptSummary {
                    name: p.name.clone(),
                })
                .collect();
            let computed_pages = self.prompts.len().div_ceil(limit) as u32;

            Ok(PromptPage {
                data,
                meta: PageMeta {
                    total_pages: self.total_pages.unwrap_or(computed_pages),
                },
            })
        }

        async fn fetch_prompt(
            &self,
            name: &str,
            options: &FetchOptions,
        ) -> Result<FetchedPrompt, UpstreamError> {
            self.fetch_calls
                .lock()
                .push((name.to_string(), options.clone()));

            self.prompts
                .iter()
                .find(|p| p.name == name)
                .cloned()
                .ok_or_else(|| UpstreamError::status(format!("memory://prompts/{name}"), 404, "not found"))?
                .ensure_kind(options.kind)
        }
    }
}
