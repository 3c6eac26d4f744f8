//! Prompt gateway implementation.
//!
//! The PromptGateway translates between the MCP prompt surface and the
//! upstream prompt service. It holds no state across calls besides the
//! shared [`PromptSource`].

use futures::future::try_join_all;
use rmcp::model::{
    GetPromptResult, JsonObject, ListPromptsResult, Prompt, PromptArgument, PromptMessage,
    PromptMessageRole,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::error::GatewayError;
use super::templates::{compile_chat, compile_template};
use super::upstream::{
    FetchOptions, ListPromptsQuery, PRODUCTION_LABEL, PromptBody, PromptKind, PromptSource,
    UpstreamError,
};
use super::variables::extract_variables;

/// One step of the prompt resolution policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionAttempt {
    Chat,
    Text,
}

impl ResolutionAttempt {
    /// Attempts in the order they are tried; the first success wins.
    pub const ORDER: [Self; 2] = [Self::Chat, Self::Text];

    fn kind(self) -> PromptKind {
        match self {
            Self::Chat => PromptKind::Chat,
            Self::Text => PromptKind::Text,
        }
    }
}

/// Gateway between MCP prompt requests and the upstream prompt service.
#[derive(Clone)]
pub struct PromptGateway {
    source: Arc<dyn PromptSource>,
}

impl PromptGateway {
    /// Create a new gateway over the given prompt source.
    pub fn new(source: Arc<dyn PromptSource>) -> Self {
        info!("Initializing PromptGateway");
        Self { source }
    }

    /// Parse a pagination cursor into a 1-based page number.
    ///
    /// An absent or empty cursor means the first page.
    pub fn parse_cursor(cursor: Option<&str>) -> Result<u32, GatewayError> {
        match cursor.map(str::trim) {
            None | Some("") => Ok(1),
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|page| *page >= 1)
                .ok_or_else(|| GatewayError::invalid_cursor(raw)),
        }
    }

    /// List one page of production prompts with their arguments.
    ///
    /// Each listed prompt is fetched individually (bypassing caches) so its
    /// template variables can be reported as optional arguments.
    #[instrument(skip(self))]
    pub async fn list_prompts(&self, cursor: Option<&str>) -> Result<ListPromptsResult, GatewayError> {
        let page = Self::parse_cursor(cursor)?;
        info!("Listing prompts (page {})", page);

        let listing = self
            .source
            .list_prompts(&ListPromptsQuery::production(page))
            .await
            .map_err(|e| {
                warn!("Error fetching prompts: {}", e);
                GatewayError::UpstreamListFailed(e)
            })?;

        let prompts = try_join_all(listing.data.iter().map(|summary| self.describe(&summary.name)))
            .await
            .map_err(|e| {
                warn!("Error fetching prompt details: {}", e);
                GatewayError::UpstreamListFailed(e)
            })?;

        let next_cursor = (listing.meta.total_pages > page).then(|| (page + 1).to_string());

        Ok(ListPromptsResult {
            prompts,
            next_cursor,
            meta: None,
        })
    }

    /// Fetch a prompt and compile it with the given arguments.
    ///
    /// Resolution tries the chat form first and falls back to the text form.
    /// The failure of the last attempt is reported when both fail.
    #[instrument(skip(self, arguments))]
    pub async fn get_prompt(
        &self,
        name: &str,
        arguments: HashMap<String, String>,
    ) -> Result<GetPromptResult, GatewayError> {
        if name.trim().is_empty() {
            return Err(GatewayError::invalid_arguments("prompt name must not be empty"));
        }
        info!("Getting prompt '{}'", name);

        let mut last_error = None;
        for attempt in ResolutionAttempt::ORDER {
            match self.resolve_as(attempt.kind(), name, &arguments).await {
                Ok(messages) => {
                    return Ok(GetPromptResult {
                        description: None,
                        messages,
                    });
                }
                Err(e) => {
                    debug!("{:?} resolution of '{}' failed: {}", attempt, name, e);
                    last_error = Some(e);
                }
            }
        }

        let cause = last_error.unwrap_or_else(|| UpstreamError::status(name, 404, String::new()));
        if cause.is_not_found() {
            warn!("Prompt '{}' not found", name);
        } else {
            warn!("Error getting prompt '{}': {}", name, cause);
        }
        Err(GatewayError::PromptResolutionFailed {
            name: name.to_string(),
            cause,
        })
    }

    /// Single resolution attempt for one prompt type.
    async fn resolve_as(
        &self,
        kind: PromptKind,
        name: &str,
        arguments: &HashMap<String, String>,
    ) -> Result<Vec<PromptMessage>, UpstreamError> {
        let options = FetchOptions {
            label: Some(PRODUCTION_LABEL.to_string()),
            kind: Some(kind),
            bypass_cache: false,
        };
        let prompt = self.source.fetch_prompt(name, &options).await?;

        let messages = match prompt.body {
            PromptBody::Chat { prompt: entries } => compile_chat(&entries, arguments)
                .into_iter()
                .map(|message| PromptMessage::new_text(message_role(&message.role), message.content))
                .collect(),
            PromptBody::Text { prompt: template } => vec![PromptMessage::new_text(
                PromptMessageRole::User,
                compile_template(&template, arguments),
            )],
        };
        Ok(messages)
    }

    /// Build the descriptor of a listed prompt.
    async fn describe(&self, name: &str) -> Result<Prompt, UpstreamError> {
        let options = FetchOptions {
            bypass_cache: true,
            ..Default::default()
        };
        let prompt = self.source.fetch_prompt(name, &options).await?;

        let arguments = extract_variables(&prompt.template_json())
            .into_iter()
            .map(|variable| PromptArgument {
                name: variable,
                title: None,
                description: None,
                required: Some(false),
            })
            .collect();

        Ok(Prompt {
            name: name.to_string(),
            title: None,
            description: None,
            arguments: Some(arguments),
            icons: None,
            meta: None,
        })
    }
}

/// Map an upstream chat role onto the two MCP prompt roles.
fn message_role(role: &str) -> PromptMessageRole {
    match role {
        "ai" | "assistant" => PromptMessageRole::Assistant,
        _ => PromptMessageRole::User,
    }
}

/// Convert protocol prompt arguments into template values.
///
/// Strings are used as-is, `null` is skipped and other JSON values are
/// rendered as JSON text.
pub fn arguments_from_json(arguments: Option<JsonObject>) -> HashMap<String, String> {
    arguments
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, value)| match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => Some((key, s)),
            other => Some((key, other.to_string())),
        })
        .collect()
}
