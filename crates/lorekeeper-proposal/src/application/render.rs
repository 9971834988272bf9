//! Prompt variable substitution.

use std::collections::HashMap;

/// Replaces every `{{name}}` token (whitespace-tolerant inside the braces)
/// with the matching variable's value. Unmatched tokens are left verbatim.
/// Substitution is literal and single-pass: values are never re-scanned.
#[must_use]
pub fn render_prompt(template: &str, variables: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find("{{") {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 2..];

        let Some(close) = after_open.find("}}") else {
            // Unterminated token; emit the remainder as-is.
            out.push_str(&rest[open..]);
            return out;
        };

        let name = after_open[..close].trim();
        match variables.get(name) {
            Some(value) => out.push_str(value),
            None => out.push_str(&rest[open..open + 2 + close + 2]),
        }
        rest = &after_open[close + 2..];
    }

    out.push_str(rest);
    out
}
