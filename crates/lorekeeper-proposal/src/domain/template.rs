//! Reusable generation templates.

use chrono::{DateTime, Utc};
use lorekeeper_core::entity::EntityKind;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A reusable prompt recipe for generating proposals against one entity kind.
///
/// Templates are operator-edited but immutable during a single generation
/// call: read, rendered, discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProposalTemplate {
    /// Unique identifier.
    pub id: Uuid,
    /// Operator-facing name.
    pub name: String,
    /// What the template is for.
    #[serde(default)]
    pub description: String,
    /// Entity kind this template targets.
    pub entity_kind: EntityKind,
    /// Prompt body with `{{variable}}` placeholders.
    pub prompt_template: String,
    /// Optional system prompt, also placeholder-substituted.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Model to use when the request names none.
    #[serde(default)]
    pub default_model: Option<String>,
    /// Whether generation with this template expects a context id.
    #[serde(default)]
    pub required_context: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Incoming template payload before the store stamps identity.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TemplateDraft {
    /// Operator-facing name. Required.
    #[serde(default)]
    pub name: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Entity kind this template targets. Required.
    #[serde(default)]
    pub entity_kind: Option<EntityKind>,
    /// Prompt body. Required.
    #[serde(default)]
    pub prompt_template: Option<String>,
    /// Optional system prompt.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// Default model id.
    #[serde(default)]
    pub default_model: Option<String>,
    /// Whether generation expects a context id. Unset leaves the current
    /// value alone on update.
    #[serde(default)]
    pub required_context: Option<bool>,
}
