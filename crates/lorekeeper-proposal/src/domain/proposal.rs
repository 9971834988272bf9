//! The change proposal aggregate and its status state machine.

use chrono::{DateTime, Utc};
use lorekeeper_core::entity::{EntityKind, RelationshipChange};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// The kind of mutation a proposal describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeType {
    /// Create a new entity from the proposal's change fields.
    Create,
    /// Overwrite named attributes on an existing entity.
    Update,
    /// Delete an existing entity.
    Delete,
    /// Create or merge one or more typed edges.
    Relate,
}

impl ChangeType {
    /// Lowercase wire name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Relate => "relate",
        }
    }
}

/// Review status of a proposal.
///
/// Transitions are monotone: a proposal leaves `Pending` exactly once, via
/// review, and never returns. The three reviewed states may move among each
/// other on subsequent reviews.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProposalStatus {
    /// Awaiting first review.
    Pending,
    /// Approved; eligible for apply.
    Approved,
    /// Rejected by a reviewer.
    Rejected,
    /// Accepted with modifications; re-reviewable like the other two.
    Modified,
}

impl ProposalStatus {
    /// Whether a review may set this proposal to `next`.
    ///
    /// The only forbidden target is `Pending`: there is no path back.
    #[must_use]
    pub fn can_transition_to(self, next: ProposalStatus) -> bool {
        next != ProposalStatus::Pending
    }

    /// Lowercase wire name, matching the serde representation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Modified => "modified",
        }
    }
}

/// One field-level change within a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeField {
    /// Attribute name on the target entity.
    #[serde(alias = "field")]
    pub name: String,
    /// Previous value, informational only. Never consulted at apply time.
    #[serde(default, alias = "oldValue")]
    pub old_value: Option<Value>,
    /// Value to write.
    #[serde(alias = "newValue")]
    pub new_value: Value,
    /// Human-readable summary of the change.
    #[serde(default)]
    pub description: String,
}

/// A reviewer or system note attached to a proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalComment {
    /// Comment body.
    pub content: String,
    /// Author id, or "system" for engine-generated notes.
    pub author: String,
    /// When the comment was added.
    pub timestamp: DateTime<Utc>,
}

/// A structured, reviewable description of a pending change to one campaign
/// entity or relationship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeProposal {
    /// Unique identifier.
    pub id: Uuid,
    /// The mutation kind.
    pub change_type: ChangeType,
    /// The entity kind this proposal targets.
    pub entity_kind: EntityKind,
    /// Target entity id. Required for update/delete, absent for create.
    #[serde(default)]
    pub entity_id: Option<String>,
    /// Short operator-facing title.
    pub title: String,
    /// What the change does.
    #[serde(default)]
    pub description: String,
    /// Why the change is proposed.
    #[serde(default)]
    pub reason: String,
    /// Ordered field-level changes.
    #[serde(default)]
    pub changes: Vec<ChangeField>,
    /// Edge changes; only meaningful when `change_type` is `Relate`.
    #[serde(default)]
    pub relationship_changes: Vec<RelationshipChange>,
    /// Review status.
    pub status: ProposalStatus,
    /// Author id.
    pub created_by: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Reviewer id, set on first review.
    #[serde(default)]
    pub reviewed_by: Option<String>,
    /// First review timestamp.
    #[serde(default)]
    pub reviewed_at: Option<DateTime<Utc>>,
    /// Comment thread, oldest first.
    #[serde(default)]
    pub comments: Vec<ProposalComment>,
    /// Campaign or session that scoped generation.
    #[serde(default)]
    pub context_id: Option<String>,
    /// Template used for generation.
    #[serde(default)]
    pub prompt_id: Option<Uuid>,
    /// Model that produced the draft.
    #[serde(default)]
    pub llm_model: Option<String>,
    /// Free-form provenance: token usage, generation errors.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl ChangeProposal {
    /// Collapses the ordered change fields into a single attribute document,
    /// later entries winning on duplicate names.
    #[must_use]
    pub fn attribute_map(&self) -> Map<String, Value> {
        let mut attributes = Map::new();
        for field in &self.changes {
            attributes.insert(field.name.clone(), field.new_value.clone());
        }
        attributes
    }
}

/// Incoming proposal payload, before the lifecycle stamps identity, status,
/// and authorship. Classification fields are optional so their absence is a
/// domain validation error rather than a deserialization failure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProposalDraft {
    /// The mutation kind. Required.
    #[serde(default)]
    pub change_type: Option<ChangeType>,
    /// The entity kind. Required.
    #[serde(default)]
    pub entity_kind: Option<EntityKind>,
    /// Target entity id.
    #[serde(default)]
    pub entity_id: Option<String>,
    /// Title; defaults to a placeholder.
    #[serde(default)]
    pub title: Option<String>,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
    /// Reason.
    #[serde(default)]
    pub reason: Option<String>,
    /// Field-level changes.
    #[serde(default)]
    pub changes: Vec<ChangeField>,
    /// Edge changes.
    #[serde(default)]
    pub relationship_changes: Vec<RelationshipChange>,
    /// Generation context id.
    #[serde(default)]
    pub context_id: Option<String>,
    /// Template id used for generation.
    #[serde(default)]
    pub prompt_id: Option<Uuid>,
    /// Model that produced the draft.
    #[serde(default)]
    pub llm_model: Option<String>,
    /// Initial comments (the generation fallback path seeds one).
    #[serde(default)]
    pub comments: Vec<String>,
    /// Free-form provenance.
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_no_status_may_transition_back_to_pending() {
        for status in [
            ProposalStatus::Pending,
            ProposalStatus::Approved,
            ProposalStatus::Rejected,
            ProposalStatus::Modified,
        ] {
            assert!(!status.can_transition_to(ProposalStatus::Pending));
        }
    }

    #[test]
    fn test_reviewed_statuses_may_move_among_each_other() {
        assert!(ProposalStatus::Approved.can_transition_to(ProposalStatus::Rejected));
        assert!(ProposalStatus::Rejected.can_transition_to(ProposalStatus::Modified));
        assert!(ProposalStatus::Modified.can_transition_to(ProposalStatus::Approved));
        assert!(ProposalStatus::Pending.can_transition_to(ProposalStatus::Approved));
    }

    #[test]
    fn test_attribute_map_collapses_fields_in_order() {
        let proposal = ChangeProposal {
            id: Uuid::new_v4(),
            change_type: ChangeType::Update,
            entity_kind: EntityKind::Character,
            entity_id: Some("abc".into()),
            title: "t".into(),
            description: String::new(),
            reason: String::new(),
            changes: vec![
                ChangeField {
                    name: "hp".into(),
                    old_value: Some(json!(10)),
                    new_value: json!(12),
                    description: String::new(),
                },
                ChangeField {
                    name: "hp".into(),
                    old_value: None,
                    new_value: json!(14),
                    description: String::new(),
                },
                ChangeField {
                    name: "name".into(),
                    old_value: None,
                    new_value: json!("Vex"),
                    description: String::new(),
                },
            ],
            relationship_changes: vec![],
            status: ProposalStatus::Pending,
            created_by: "gm".into(),
            created_at: Utc::now(),
            reviewed_by: None,
            reviewed_at: None,
            comments: vec![],
            context_id: None,
            prompt_id: None,
            llm_model: None,
            metadata: Map::new(),
        };

        let attributes = proposal.attribute_map();
        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes["hp"], json!(14));
        assert_eq!(attributes["name"], json!("Vex"));
    }

    #[test]
    fn test_change_type_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ChangeType::Relate).unwrap(),
            "\"relate\""
        );
        let parsed: ChangeType = serde_json::from_str("\"delete\"").unwrap();
        assert_eq!(parsed, ChangeType::Delete);
    }
}
