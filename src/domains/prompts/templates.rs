//! Prompt template compilation.
//!
//! Compiling substitutes caller-supplied argument values into the
//! `{{variable}}` placeholders of a fetched prompt. Chat prompts are
//! compiled message by message; text prompts produce a single string.

use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;

use super::upstream::{ChatEntry, ChatMessage};

/// Placeholder with optional whitespace around the variable name.
static SUBSTITUTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("substitution pattern is valid")
});

/// Render a template string with the given arguments.
///
/// - `{{variable}}` and `{{ variable }}` are replaced with the argument value
/// - placeholders without a supplied value are left untouched
///
/// Unlike mustache rendering (as done by Langfuse's JS SDK), a missing
/// variable is not rendered as an empty string, so the client can see which
/// arguments it still has to supply.
pub fn compile_template(template: &str, arguments: &HashMap<String, String>) -> String {
    SUBSTITUTION_REGEX
        .replace_all(template, |captures: &Captures<'_>| {
            let name = captures.get(1).map_or("", |m| m.as_str());
            match arguments.get(name) {
                Some(value) => value.clone(),
                None => captures[0].to_string(),
            }
        })
        .into_owned()
}

/// Compile every message of a chat prompt.
///
/// Placeholder slots (message-list insertion points) carry no content of
/// their own and are dropped.
pub fn compile_chat(entries: &[ChatEntry], arguments: &HashMap<String, String>) -> Vec<ChatMessage> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            ChatEntry::Message(message) => Some(ChatMessage {
                role: message.role.clone(),
                content: compile_template(&message.content, arguments),
            }),
            ChatEntry::Placeholder { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_substitution() {
        let result = compile_template("Hello, {{name}}!", &args(&[("name", "World")]));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_whitespace_inside_braces() {
        let result = compile_template("Hello, {{ name }}!", &args(&[("name", "World")]));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_missing_argument_left_verbatim() {
        let result = compile_template("{{greeting}}, {{name}}", &args(&[("name", "Ada")]));
        assert_eq!(result, "{{greeting}}, Ada");
    }

    #[test]
    fn test_repeated_placeholder() {
        let result = compile_template("{{x}} and {{x}}", &args(&[("x", "y")]));
        assert_eq!(result, "y and y");
    }

    #[test]
    fn test_value_is_not_reinterpreted() {
        let result = compile_template("{{a}}", &args(&[("a", "{{b}}"), ("b", "nope")]));
        assert_eq!(result, "{{b}}");
    }

    #[test]
    fn test_compile_chat_drops_placeholders() {
        let entries = vec![
            ChatEntry::Message(ChatMessage {
                role: "system".to_string(),
                content: "You are {{persona}}".to_string(),
            }),
            ChatEntry::Placeholder {
                name: "history".to_string(),
            },
            ChatEntry::Message(ChatMessage {
                role: "user".to_string(),
                content: "Hi".to_string(),
            }),
        ];

        let messages = compile_chat(&entries, &args(&[("persona", "a pirate")]));
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content, "You are a pirate");
        assert_eq!(messages[1].content, "Hi");
    }
}
