//! Read-side handlers for proposals.

use lorekeeper_core::error::DomainError;
use uuid::Uuid;

use crate::domain::ChangeProposal;
use crate::store::{ProposalFilter, ProposalStore};

/// Fetches one proposal.
///
/// # Errors
///
/// Returns `DomainError::NotFound` when no such proposal exists.
pub async fn get_proposal(
    id: Uuid,
    store: &dyn ProposalStore,
) -> Result<ChangeProposal, DomainError> {
    store
        .get(id)
        .await?
        .ok_or_else(|| DomainError::NotFound("proposal", id.to_string()))
}

/// Lists proposals matching the filter, newest first.
///
/// # Errors
///
/// Store errors propagate.
pub async fn list_proposals(
    filter: &ProposalFilter,
    store: &dyn ProposalStore,
) -> Result<Vec<ChangeProposal>, DomainError> {
    store.list(filter).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::lifecycle::create_proposal;
    use crate::domain::{ChangeType, ProposalDraft, ProposalStatus};
    use chrono::{TimeZone, Utc};
    use lorekeeper_core::entity::EntityKind;
    use lorekeeper_test_support::FixedClock;

    use crate::testing::InMemoryProposalStore;

    #[tokio::test]
    async fn test_get_proposal_maps_absence_to_not_found() {
        let store = InMemoryProposalStore::new();

        let result = get_proposal(Uuid::new_v4(), &store).await;

        assert!(matches!(result, Err(DomainError::NotFound("proposal", _))));
    }

    #[tokio::test]
    async fn test_list_applies_filter() {
        // Arrange — two proposals, different kinds.
        let store = InMemoryProposalStore::new();
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap());
        for kind in [EntityKind::Character, EntityKind::Location] {
            create_proposal(
                ProposalDraft {
                    change_type: Some(ChangeType::Update),
                    entity_kind: Some(kind),
                    title: Some(format!("change a {kind}")),
                    ..Default::default()
                },
                "gm",
                &clock,
                &store,
            )
            .await
            .unwrap();
        }

        // Act
        let filter = ProposalFilter {
            entity_kind: Some(EntityKind::Location),
            status: Some(ProposalStatus::Pending),
            ..Default::default()
        };
        let listed = list_proposals(&filter, &store).await.unwrap();

        // Assert
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].entity_kind, EntityKind::Location);
    }
}
