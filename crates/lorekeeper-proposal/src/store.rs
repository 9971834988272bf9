//! Persistence traits for proposals and templates, plus the list filter.
//!
//! The backing store is an opaque collaborator; implementations live in
//! `lorekeeper-store` (PostgreSQL) and `lorekeeper-test-support` (in-memory).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lorekeeper_core::entity::EntityKind;
use lorekeeper_core::error::DomainError;
use serde::Deserialize;
use uuid::Uuid;

use crate::domain::{ChangeProposal, ChangeType, ProposalStatus, ProposalTemplate};

/// Filter for proposal listings. All fields are conjunctive; `None` matches
/// everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProposalFilter {
    /// Match on status.
    pub status: Option<ProposalStatus>,
    /// Match on change type.
    #[serde(rename = "type")]
    pub change_type: Option<ChangeType>,
    /// Match on target entity kind.
    #[serde(rename = "entityType")]
    pub entity_kind: Option<EntityKind>,
    /// Match on target entity id.
    #[serde(rename = "entityId")]
    pub entity_id: Option<String>,
    /// Match on generation context id.
    #[serde(rename = "contextId")]
    pub context_id: Option<String>,
    /// Match on author.
    #[serde(rename = "createdBy")]
    pub created_by: Option<String>,
    /// Created strictly after this instant.
    #[serde(rename = "createdAfter")]
    pub created_after: Option<DateTime<Utc>>,
    /// Created strictly before this instant.
    #[serde(rename = "createdBefore")]
    pub created_before: Option<DateTime<Utc>>,
    /// Case-insensitive substring search over title, description, and reason.
    pub search: Option<String>,
}

impl ProposalFilter {
    /// Whether a proposal satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, proposal: &ChangeProposal) -> bool {
        if self.status.is_some_and(|s| s != proposal.status) {
            return false;
        }
        if self.change_type.is_some_and(|t| t != proposal.change_type) {
            return false;
        }
        if self.entity_kind.is_some_and(|k| k != proposal.entity_kind) {
            return false;
        }
        if let Some(entity_id) = &self.entity_id {
            if proposal.entity_id.as_deref() != Some(entity_id.as_str()) {
                return false;
            }
        }
        if let Some(context_id) = &self.context_id {
            if proposal.context_id.as_deref() != Some(context_id.as_str()) {
                return false;
            }
        }
        if let Some(created_by) = &self.created_by {
            if &proposal.created_by != created_by {
                return false;
            }
        }
        if self.created_after.is_some_and(|t| proposal.created_at <= t) {
            return false;
        }
        if self.created_before.is_some_and(|t| proposal.created_at >= t) {
            return false;
        }
        if let Some(search) = &self.search {
            let needle = search.to_lowercase();
            let haystack = format!(
                "{} {} {}",
                proposal.title, proposal.description, proposal.reason
            )
            .to_lowercase();
            if !haystack.contains(&needle) {
                return false;
            }
        }
        true
    }
}

/// Persistence contract for proposals.
#[async_trait]
pub trait ProposalStore: Send + Sync {
    /// Persist a new proposal.
    async fn insert(&self, proposal: &ChangeProposal) -> Result<(), DomainError>;

    /// Overwrite an existing proposal. Last write wins; there is no version
    /// check on the status column.
    async fn update(&self, proposal: &ChangeProposal) -> Result<(), DomainError>;

    /// Fetch a proposal by id.
    async fn get(&self, id: Uuid) -> Result<Option<ChangeProposal>, DomainError>;

    /// List proposals matching a filter, newest first.
    async fn list(&self, filter: &ProposalFilter) -> Result<Vec<ChangeProposal>, DomainError>;

    /// Delete a proposal. Returns `false` when absent.
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

/// Persistence contract for templates.
#[async_trait]
pub trait TemplateStore: Send + Sync {
    /// Persist a new template.
    async fn insert(&self, template: &ProposalTemplate) -> Result<(), DomainError>;

    /// Overwrite an existing template.
    async fn update(&self, template: &ProposalTemplate) -> Result<(), DomainError>;

    /// Fetch a template by id.
    async fn get(&self, id: Uuid) -> Result<Option<ProposalTemplate>, DomainError>;

    /// List templates, optionally restricted to one entity kind, oldest
    /// first so "first registered for the kind" is stable.
    async fn list(&self, entity_kind: Option<EntityKind>)
    -> Result<Vec<ProposalTemplate>, DomainError>;

    /// Delete a template. Returns `false` when absent.
    async fn delete(&self, id: Uuid) -> Result<bool, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::Map;

    fn proposal() -> ChangeProposal {
        ChangeProposal {
            id: Uuid::new_v4(),
            change_type: ChangeType::Update,
            entity_kind: EntityKind::Character,
            entity_id: Some("abc-123".into()),
            title: "Raise Vex's strength".into(),
            description: "Training montage payoff".into(),
            reason: "Session 12 outcome".into(),
            changes: vec![],
            relationship_changes: vec![],
            status: ProposalStatus::Pending,
            created_by: "gm".into(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            reviewed_by: None,
            reviewed_at: None,
            comments: vec![],
            context_id: Some("campaign-1".into()),
            prompt_id: None,
            llm_model: None,
            metadata: Map::new(),
        }
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        assert!(ProposalFilter::default().matches(&proposal()));
    }

    #[test]
    fn test_filter_rejects_on_any_mismatched_criterion() {
        let filter = ProposalFilter {
            status: Some(ProposalStatus::Approved),
            ..Default::default()
        };
        assert!(!filter.matches(&proposal()));

        let filter = ProposalFilter {
            entity_id: Some("other".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&proposal()));
    }

    #[test]
    fn test_search_is_case_insensitive_over_narrative_fields() {
        let filter = ProposalFilter {
            search: Some("VEX".into()),
            ..Default::default()
        };
        assert!(filter.matches(&proposal()));

        let filter = ProposalFilter {
            search: Some("montage".into()),
            ..Default::default()
        };
        assert!(filter.matches(&proposal()));

        let filter = ProposalFilter {
            search: Some("absent".into()),
            ..Default::default()
        };
        assert!(!filter.matches(&proposal()));
    }

    #[test]
    fn test_date_bounds_are_strict() {
        let created = proposal().created_at;
        let filter = ProposalFilter {
            created_after: Some(created),
            ..Default::default()
        };
        assert!(!filter.matches(&proposal()));

        let filter = ProposalFilter {
            created_after: Some(created - chrono::Duration::seconds(1)),
            created_before: Some(created + chrono::Duration::seconds(1)),
            ..Default::default()
        };
        assert!(filter.matches(&proposal()));
    }
}
