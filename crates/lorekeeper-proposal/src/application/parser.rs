//! Model output parsing.
//!
//! Raw completions are free text that usually, but not always, contains a
//! JSON proposal. Parsing is failure-tolerant by contract: the outcome is an
//! explicit result type, and the fallback branch is an expected, first-class
//! path — every generation attempt must yield a reviewable artifact.

use lorekeeper_core::entity::RelationshipChange;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::{ChangeField, ChangeType};

/// Title given to fallback proposals so reviewers can spot them in listings.
pub const FALLBACK_TITLE: &str = "Unparseable model response";

/// Placeholder title for parsed drafts that omit one.
pub const DEFAULT_TITLE: &str = "Untitled proposal";

/// Placeholder description.
pub const DEFAULT_DESCRIPTION: &str = "No description provided";

/// Placeholder reason.
pub const DEFAULT_REASON: &str = "No reason provided";

/// A structurally valid draft decoded from model output, defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedDraft {
    /// The mutation kind; defaults to `Update` when absent.
    pub change_type: ChangeType,
    /// Proposal title.
    pub title: String,
    /// Proposal description.
    pub description: String,
    /// Proposal reason.
    pub reason: String,
    /// Field-level changes; malformed entries are dropped.
    pub changes: Vec<ChangeField>,
    /// Edge changes; malformed entries are dropped.
    pub relationship_changes: Vec<RelationshipChange>,
}

/// Result of parsing one model completion.
#[derive(Debug)]
pub enum ParseOutcome {
    /// The completion contained a decodable proposal.
    Parsed(ParsedDraft),
    /// The completion could not be decoded; the raw text and error are
    /// preserved for the fallback proposal's review comment.
    Fallback {
        /// The unmodified model output.
        raw: String,
        /// Why decoding failed.
        error: String,
    },
}

#[derive(Debug, Default, Deserialize)]
struct RawDraft {
    #[serde(default, rename = "type", alias = "change_type", alias = "changeType")]
    type_name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    changes: Vec<Value>,
    #[serde(default, alias = "relationshipChanges")]
    relationship_changes: Vec<Value>,
}

fn change_type_from(name: Option<&str>) -> ChangeType {
    match name.map(str::to_lowercase).as_deref() {
        Some("create") => ChangeType::Create,
        Some("delete") => ChangeType::Delete,
        Some("relate") => ChangeType::Relate,
        // Unknown or missing types default to the least destructive kind.
        _ => ChangeType::Update,
    }
}

/// Locates the JSON substring of a completion: a fenced block labeled
/// "json", else any fenced block, else the first top-level `{...}` match,
/// else the raw text.
#[must_use]
pub fn extract_json(raw: &str) -> &str {
    if let Some(block) = fenced_block(raw, "```json") {
        return block;
    }
    if let Some(block) = fenced_block(raw, "```") {
        return block;
    }
    if let Some(object) = first_object(raw) {
        return object;
    }
    raw
}

fn fenced_block<'a>(raw: &'a str, opener: &str) -> Option<&'a str> {
    let start = raw.find(opener)? + opener.len();
    let body = &raw[start..];
    // Skip the rest of the fence line (a language tag for bare ``` fences).
    let body = body.find('\n').map_or(body, |nl| &body[nl + 1..]);
    let end = body.find("```")?;
    Some(body[..end].trim())
}

fn first_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let bytes = raw.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &byte) in bytes[start..].iter().enumerate() {
        if escaped {
            escaped = false;
            continue;
        }
        match byte {
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&raw[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Parses one completion into a draft or a fallback.
///
/// Never fails: any decode error is folded into [`ParseOutcome::Fallback`]
/// with the raw text preserved.
#[must_use]
pub fn parse_model_output(raw: &str) -> ParseOutcome {
    let candidate = extract_json(raw).trim();

    let value: Value = match serde_json::from_str(candidate) {
        Ok(value) => value,
        Err(e) => {
            return ParseOutcome::Fallback {
                raw: raw.to_owned(),
                error: format!("invalid JSON: {e}"),
            };
        }
    };

    // An array is tolerated when its first element is the proposal object.
    let object = match value {
        Value::Object(map) => Value::Object(map),
        Value::Array(items) => match items.into_iter().find(|v| v.is_object()) {
            Some(object) => object,
            None => {
                return ParseOutcome::Fallback {
                    raw: raw.to_owned(),
                    error: "top-level array contained no object".to_owned(),
                };
            }
        },
        other => {
            return ParseOutcome::Fallback {
                raw: raw.to_owned(),
                error: format!("expected a JSON object, got {}", value_kind(&other)),
            };
        }
    };

    let draft: RawDraft = match serde_json::from_value(object) {
        Ok(draft) => draft,
        Err(e) => {
            return ParseOutcome::Fallback {
                raw: raw.to_owned(),
                error: format!("proposal shape mismatch: {e}"),
            };
        }
    };

    let changes = draft
        .changes
        .into_iter()
        .filter_map(|v| serde_json::from_value::<ChangeField>(v).ok())
        .collect();
    let relationship_changes = draft
        .relationship_changes
        .into_iter()
        .filter_map(|v| serde_json::from_value::<RelationshipChange>(v).ok())
        .collect();

    ParseOutcome::Parsed(ParsedDraft {
        change_type: change_type_from(draft.type_name.as_deref()),
        title: draft.title.unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
        description: draft
            .description
            .unwrap_or_else(|| DEFAULT_DESCRIPTION.to_owned()),
        reason: draft.reason.unwrap_or_else(|| DEFAULT_REASON.to_owned()),
        changes,
        relationship_changes,
    })
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
