// Shared prompt fragments. Each pipeline defines its own prompts.rs alongside it.

use std::collections::HashMap;

/// Closing instruction appended to every structured-output prompt.
pub const JSON_ONLY_INSTRUCTION: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Placeholder rendered in prompts when a stage receives no feedback.
pub const NO_FEEDBACK: &str = "None";

/// Builds a system prompt from a role sentence plus the JSON-only contract.
pub fn json_system(role: &str) -> String {
    format!("{role} {JSON_ONLY_INSTRUCTION}")
}

/// Renders a list as `- item` lines, the shape every prompt uses for constraints.
pub fn bullet_list(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Substitutes `{name}` placeholders in a single pass over the template.
///
/// Inserted values are copied verbatim, so text that itself contains `{name}`
/// is never expanded. Braces that do not enclose a known name are kept as-is.
pub fn render(template: &str, vars: &[(&str, &str)]) -> String {
    let vars: HashMap<&str, &str> = vars.iter().copied().collect();
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after
            .find('}')
            .and_then(|close| vars.get(&after[..close]).map(|v| (close, *v)));

        match value {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bullet_list_formats_each_line() {
        let items = vec!["A is left of B".to_string(), "C drinks tea".to_string()];
        assert_eq!(bullet_list(&items), "- A is left of B\n- C drinks tea");
    }

    #[test]
    fn test_render_replaces_all_occurrences() {
        let out = render("{a} and {b} and {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(out, "x and y and x");
    }

    #[test]
    fn test_render_keeps_placeholders_inside_values() {
        let out = render(
            "Puzzle: {puzzle}\nFeedback: {feedback}",
            &[("puzzle", "Find {feedback} here"), ("feedback", "Issue in solver: X")],
        );
        assert_eq!(out, "Puzzle: Find {feedback} here\nFeedback: Issue in solver: X");
    }

    #[test]
    fn test_render_leaves_json_braces_and_unknown_names() {
        let out = render(r#"{"answer": "{x}", "n": {missing}}"#, &[("x", "42")]);
        assert_eq!(out, r#"{"answer": "42", "n": {missing}}"#);
    }

    #[test]
    fn test_json_system_carries_contract() {
        assert!(json_system("You are a solver.").contains("valid JSON only"));
    }
}
