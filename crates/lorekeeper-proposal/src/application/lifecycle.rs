//! Lifecycle command handlers: create, review, comment, apply.

use lorekeeper_core::clock::Clock;
use lorekeeper_core::error::DomainError;
use lorekeeper_core::repository::{EntityRepositorySet, RelationshipWriter};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    ChangeProposal, ChangeType, ProposalComment, ProposalDraft, ProposalStatus,
};
use crate::store::ProposalStore;

/// Author recorded on engine-generated comments.
pub const SYSTEM_AUTHOR: &str = "system";

/// Per-edge result of a RELATE apply.
#[derive(Debug, Clone, Serialize)]
pub struct RelationshipOutcome {
    /// Position in the proposal's relationship list.
    pub index: usize,
    /// Edge type attempted.
    pub relationship_type: String,
    /// Whether the edge write succeeded.
    pub success: bool,
    /// Failure detail when it did not.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of applying an approved proposal.
#[derive(Debug, Clone, Serialize)]
pub struct ApplyOutcome {
    /// The proposal that was applied.
    pub proposal_id: Uuid,
    /// The mutation kind that was dispatched.
    pub change_type: ChangeType,
    /// The affected entity id: store-assigned for creates, the target for
    /// updates and deletes, absent for relates.
    pub entity_id: Option<String>,
    /// Per-edge outcomes; empty unless the proposal is a RELATE.
    pub relationships: Vec<RelationshipOutcome>,
    /// Overall success. A RELATE apply is applied only if every edge wrote.
    pub applied: bool,
}

fn validate_author(author: &str) -> Result<(), DomainError> {
    if author.trim().is_empty() {
        return Err(DomainError::Validation("author is required".to_owned()));
    }
    Ok(())
}

/// Creates a proposal from a draft, forcing `status = Pending` and stamping
/// authorship.
///
/// # Errors
///
/// Returns `DomainError::Validation` if the draft lacks a change type or
/// entity kind, or the author is blank; store errors propagate.
pub async fn create_proposal(
    draft: ProposalDraft,
    author: &str,
    clock: &dyn Clock,
    store: &dyn ProposalStore,
) -> Result<ChangeProposal, DomainError> {
    validate_author(author)?;
    let change_type = draft
        .change_type
        .ok_or_else(|| DomainError::Validation("proposal type is required".to_owned()))?;
    let entity_kind = draft
        .entity_kind
        .ok_or_else(|| DomainError::Validation("entity type is required".to_owned()))?;

    let now = clock.now();
    let proposal = ChangeProposal {
        id: Uuid::new_v4(),
        change_type,
        entity_kind,
        entity_id: draft.entity_id,
        title: draft
            .title
            .unwrap_or_else(|| super::parser::DEFAULT_TITLE.to_owned()),
        description: draft.description.unwrap_or_default(),
        reason: draft.reason.unwrap_or_default(),
        changes: draft.changes,
        relationship_changes: draft.relationship_changes,
        status: ProposalStatus::Pending,
        created_by: author.to_owned(),
        created_at: now,
        reviewed_by: None,
        reviewed_at: None,
        comments: draft
            .comments
            .into_iter()
            .map(|content| ProposalComment {
                content,
                author: author.to_owned(),
                timestamp: now,
            })
            .collect(),
        context_id: draft.context_id,
        prompt_id: draft.prompt_id,
        llm_model: draft.llm_model,
        metadata: draft.metadata,
    };

    store.insert(&proposal).await?;
    info!(proposal_id = %proposal.id, change_type = ?change_type, "proposal created");
    Ok(proposal)
}

/// Reviews a proposal: the only path that advances status away from
/// `Pending`. Appends the optional comment as a side effect.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown id and a precondition
/// error when the target status is `Pending` (no transition re-enters it).
pub async fn review_proposal(
    id: Uuid,
    new_status: ProposalStatus,
    reviewer: &str,
    comment: Option<String>,
    clock: &dyn Clock,
    store: &dyn ProposalStore,
) -> Result<ChangeProposal, DomainError> {
    validate_author(reviewer)?;
    let mut proposal = store
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound("proposal", id.to_string()))?;

    if !proposal.status.can_transition_to(new_status) {
        return Err(DomainError::precondition(
            "invalid_transition",
            format!(
                "cannot move proposal from {:?} to {:?}",
                proposal.status, new_status
            ),
        ));
    }

    let now = clock.now();
    proposal.status = new_status;
    if proposal.reviewed_by.is_none() {
        proposal.reviewed_by = Some(reviewer.to_owned());
        proposal.reviewed_at = Some(now);
    }
    if let Some(content) = comment.filter(|c| !c.trim().is_empty()) {
        proposal.comments.push(ProposalComment {
            content,
            author: reviewer.to_owned(),
            timestamp: now,
        });
    }

    store.update(&proposal).await?;
    info!(proposal_id = %id, status = ?new_status, "proposal reviewed");
    Ok(proposal)
}

/// Appends a comment without altering status.
///
/// # Errors
///
/// Returns `DomainError::Validation` for empty content or a blank author,
/// `DomainError::NotFound` for an unknown id.
pub async fn add_comment(
    id: Uuid,
    content: &str,
    author: &str,
    clock: &dyn Clock,
    store: &dyn ProposalStore,
) -> Result<ChangeProposal, DomainError> {
    validate_author(author)?;
    if content.trim().is_empty() {
        return Err(DomainError::Validation(
            "comment content is required".to_owned(),
        ));
    }

    let mut proposal = store
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound("proposal", id.to_string()))?;

    proposal.comments.push(ProposalComment {
        content: content.to_owned(),
        author: author.to_owned(),
        timestamp: clock.now(),
    });

    store.update(&proposal).await?;
    Ok(proposal)
}

/// Edits a proposal's narrative fields; classification, payload, and status
/// are immutable through this path.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown id.
pub async fn update_proposal(
    id: Uuid,
    title: Option<String>,
    description: Option<String>,
    reason: Option<String>,
    store: &dyn ProposalStore,
) -> Result<ChangeProposal, DomainError> {
    let mut proposal = store
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound("proposal", id.to_string()))?;

    if let Some(title) = title {
        proposal.title = title;
    }
    if let Some(description) = description {
        proposal.description = description;
    }
    if let Some(reason) = reason {
        proposal.reason = reason;
    }

    store.update(&proposal).await?;
    Ok(proposal)
}

/// Deletes a proposal.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when no such proposal exists.
pub async fn delete_proposal(id: Uuid, store: &dyn ProposalStore) -> Result<(), DomainError> {
    if store.delete(id).await? {
        Ok(())
    } else {
        Err(DomainError::NotFound("proposal", id.to_string()))
    }
}

/// Applies an approved proposal: dispatches its mutation to the repository
/// for its entity kind, or writes its edges for a RELATE.
///
/// RELATE edges are attempted independently in list order; the outcome
/// carries one result per edge and `applied` is true only if all succeeded.
/// On success the proposal is re-stamped `Approved` and a system comment
/// records the application. There is no distinct applied state.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown proposal, a precondition
/// error when the proposal is not approved (no repository is touched), and
/// validation errors for a missing target id or an empty RELATE payload.
/// A DELETE whose target does not resolve fails with `NotFound`.
pub async fn apply_proposal(
    id: Uuid,
    requester: &str,
    clock: &dyn Clock,
    store: &dyn ProposalStore,
    repositories: &EntityRepositorySet,
    relationship_writer: &dyn RelationshipWriter,
) -> Result<ApplyOutcome, DomainError> {
    validate_author(requester)?;
    let mut proposal = store
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound("proposal", id.to_string()))?;

    if proposal.status != ProposalStatus::Approved {
        return Err(DomainError::precondition(
            "proposal_not_approved",
            format!("proposal {id} has status {:?}", proposal.status),
        ));
    }

    let repository = repositories.for_kind(proposal.entity_kind);
    let mut entity_id = None;
    let mut relationships = Vec::new();
    let mut applied = true;

    match proposal.change_type {
        ChangeType::Create => {
            let entity = repository.create(proposal.attribute_map()).await?;
            entity_id = Some(entity.id);
        }
        ChangeType::Update => {
            let target = proposal.entity_id.clone().ok_or_else(|| {
                DomainError::Validation("update proposal has no entity id".to_owned())
            })?;
            repository.update(&target, proposal.attribute_map()).await?;
            entity_id = Some(target);
        }
        ChangeType::Delete => {
            let target = proposal.entity_id.clone().ok_or_else(|| {
                DomainError::Validation("delete proposal has no entity id".to_owned())
            })?;
            if !repository.delete(&target).await? {
                return Err(DomainError::NotFound("entity", target));
            }
            entity_id = Some(target);
        }
        ChangeType::Relate => {
            if proposal.relationship_changes.is_empty() {
                return Err(DomainError::Validation(
                    "relate proposal carries no relationship changes".to_owned(),
                ));
            }
            for (index, change) in proposal.relationship_changes.iter().enumerate() {
                let result = relationship_writer.relate(change).await;
                let (success, error) = match result {
                    Ok(()) => (true, None),
                    Err(e) => {
                        warn!(proposal_id = %id, index, error = %e, "edge write failed");
                        (false, Some(e.to_string()))
                    }
                };
                applied &= success;
                relationships.push(RelationshipOutcome {
                    index,
                    relationship_type: change.relationship_type.clone(),
                    success,
                    error,
                });
            }
        }
    }

    if applied {
        // Idempotent re-stamp; applied-ness is tracked via the comment only.
        proposal.status = ProposalStatus::Approved;
        proposal.comments.push(ProposalComment {
            content: format!("Proposal applied successfully by {requester}"),
            author: SYSTEM_AUTHOR.to_owned(),
            timestamp: clock.now(),
        });
        store.update(&proposal).await?;
        info!(proposal_id = %id, change_type = ?proposal.change_type, "proposal applied");
    }

    Ok(ApplyOutcome {
        proposal_id: id,
        change_type: proposal.change_type,
        entity_id,
        relationships,
        applied,
    })
}
