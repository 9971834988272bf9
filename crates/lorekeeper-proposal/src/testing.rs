//! In-memory store implementations for tests.
//!
//! These live here rather than in the shared test-support crate so the
//! lifecycle unit tests and downstream integration tests exercise the same
//! trait definitions without a dependency cycle.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use lorekeeper_core::entity::EntityKind;
use lorekeeper_core::error::DomainError;
use uuid::Uuid;

use crate::domain::{ChangeProposal, ProposalTemplate};
use crate::store::{ProposalFilter, ProposalStore, TemplateStore};

/// In-memory `ProposalStore` backed by a hash map.
#[derive(Debug, Default)]
pub struct InMemoryProposalStore {
    proposals: Mutex<HashMap<Uuid, ChangeProposal>>,
}

impl InMemoryProposalStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProposalStore for InMemoryProposalStore {
    async fn insert(&self, proposal: &ChangeProposal) -> Result<(), DomainError> {
        self.proposals
            .lock()
            .unwrap()
            .insert(proposal.id, proposal.clone());
        Ok(())
    }

    async fn update(&self, proposal: &ChangeProposal) -> Result<(), DomainError> {
        self.proposals
            .lock()
            .unwrap()
            .insert(proposal.id, proposal.clone());
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChangeProposal>, DomainError> {
        Ok(self.proposals.lock().unwrap().get(&id).cloned())
    }

    async fn list(&self, filter: &ProposalFilter) -> Result<Vec<ChangeProposal>, DomainError> {
        let mut matching: Vec<ChangeProposal> = self
            .proposals
            .lock()
            .unwrap()
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        Ok(self.proposals.lock().unwrap().remove(&id).is_some())
    }
}

/// In-memory `TemplateStore` preserving insertion order, so "first template
/// registered for a kind" behaves as in production.
#[derive(Debug, Default)]
pub struct InMemoryTemplateStore {
    templates: Mutex<Vec<ProposalTemplate>>,
}

impl InMemoryTemplateStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateStore for InMemoryTemplateStore {
    async fn insert(&self, template: &ProposalTemplate) -> Result<(), DomainError> {
        self.templates.lock().unwrap().push(template.clone());
        Ok(())
    }

    async fn update(&self, template: &ProposalTemplate) -> Result<(), DomainError> {
        let mut templates = self.templates.lock().unwrap();
        match templates.iter_mut().find(|t| t.id == template.id) {
            Some(slot) => {
                *slot = template.clone();
                Ok(())
            }
            None => Err(DomainError::NotFound("template", template.id.to_string())),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<ProposalTemplate>, DomainError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn list(
        &self,
        entity_kind: Option<EntityKind>,
    ) -> Result<Vec<ProposalTemplate>, DomainError> {
        Ok(self
            .templates
            .lock()
            .unwrap()
            .iter()
            .filter(|t| entity_kind.is_none_or(|k| t.entity_kind == k))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut templates = self.templates.lock().unwrap();
        let before = templates.len();
        templates.retain(|t| t.id != id);
        Ok(templates.len() < before)
    }
}
