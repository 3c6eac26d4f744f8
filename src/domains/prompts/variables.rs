//! Template variable extraction.
//!
//! Langfuse templates interpolate values with a double-brace syntax
//! (`{{variable}}`). This module finds the variable names a template
//! references so they can be advertised as prompt arguments.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Matches `{{inner}}` where `inner` contains no braces.
static PLACEHOLDER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([^{}]*)\}\}").expect("placeholder pattern is valid"));

/// Letters and underscores only, starting with a letter.
static VARIABLE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z_]*$").expect("variable pattern is valid"));

/// Check whether a placeholder body is a valid variable name.
pub fn is_valid_variable_name(variable: &str) -> bool {
    VARIABLE_REGEX.is_match(variable)
}

/// Extract the distinct variable names referenced by a template.
///
/// Names are returned in order of first occurrence. Placeholders whose body
/// is not a valid variable name (digits, dots, whitespace, ...) are ignored.
pub fn extract_variables(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    PLACEHOLDER_REGEX
        .captures_iter(template)
        .filter_map(|captures| captures.get(1))
        .map(|inner| inner.as_str())
        .filter(|name| is_valid_variable_name(name))
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_simple_variables() {
        let vars = extract_variables("Hello {{name}}, you are {{age}}");
        assert_eq!(vars, vec!["name", "age"]);
    }

    #[test]
    fn test_rejects_invalid_names() {
        let vars = extract_variables("{{1bad}} {{ok_name}}");
        assert_eq!(vars, vec!["ok_name"]);

        assert!(extract_variables("{{user.name}} {{a1}} {{ spaced }} {{}}").is_empty());
    }

    #[test]
    fn test_deduplicates_in_first_occurrence_order() {
        let vars = extract_variables("{{b}} {{a}} {{b}} {{c}} {{a}}");
        assert_eq!(vars, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_no_placeholders() {
        assert!(extract_variables("").is_empty());
        assert!(extract_variables("plain text with { single } braces").is_empty());
        assert!(extract_variables("{{unclosed").is_empty());
    }

    #[test]
    fn test_serialized_chat_prompt() {
        let chat = serde_json::json!([
            { "role": "system", "content": "You are {{persona}}." },
            { "role": "user", "content": "Summarize {{topic}} for {{persona}}" }
        ]);
        let vars = extract_variables(&serde_json::to_string(&chat).unwrap());
        assert_eq!(vars, vec!["persona", "topic"]);
    }

    #[test]
    fn test_output_is_always_unique_and_valid() {
        let samples = [
            "{{a}}{{a}}{{A_b}}{{_x}}{{x_}}",
            "{{{nested}}} {{x y}} {{tab\t}} {{ok}}",
            "{{é}} {{snake_case_name}} {{CamelCase}} {{9}}",
            "}}{{ {{ }} {{q}}}}",
        ];

        for sample in samples {
            let vars = extract_variables(sample);
            let unique: HashSet<_> = vars.iter().collect();
            assert_eq!(unique.len(), vars.len(), "duplicates in {sample:?}");
            assert!(vars.iter().all(|v| is_valid_variable_name(v)));
        }
    }

    #[test]
    fn test_is_valid_variable_name() {
        assert!(is_valid_variable_name("name"));
        assert!(is_valid_variable_name("first_name"));
        assert!(is_valid_variable_name("X"));
        assert!(!is_valid_variable_name("_private"));
        assert!(!is_valid_variable_name("name2"));
        assert!(!is_valid_variable_name("a.b"));
        assert!(!is_valid_variable_name(" name"));
        assert!(!is_valid_variable_name(""));
    }
}
