//! Shared application state.

use std::sync::Arc;

use lorekeeper_core::clock::Clock;
use lorekeeper_core::repository::{EntityRepositorySet, RelationshipWriter};
use lorekeeper_llm::ChatClient;
use lorekeeper_proposal::store::{ProposalStore, TemplateStore};

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Clock used for all lifecycle timestamps.
    pub clock: Arc<dyn Clock>,
    /// Proposal persistence.
    pub proposals: Arc<dyn ProposalStore>,
    /// Template persistence.
    pub templates: Arc<dyn TemplateStore>,
    /// Per-kind entity repositories for apply dispatch and context loading.
    pub repositories: Arc<EntityRepositorySet>,
    /// Edge writer for RELATE proposals.
    pub relationship_writer: Arc<dyn RelationshipWriter>,
    /// Model client for proposal generation.
    pub chat: Arc<dyn ChatClient>,
}
