//! Entity repository abstractions and the kind-to-repository dispatch set.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::entity::{Entity, EntityKind, RelationshipChange};
use crate::error::DomainError;

/// Repository contract for one entity kind.
///
/// The graph store behind this trait is an opaque collaborator; the proposal
/// engine only ever sees flat attribute documents.
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Create an entity from an attribute document, returning the stored
    /// entity with its assigned id.
    async fn create(&self, attributes: Map<String, Value>) -> Result<Entity, DomainError>;

    /// Overwrite the named attributes of an existing entity.
    async fn update(
        &self,
        id: &str,
        attributes: Map<String, Value>,
    ) -> Result<Entity, DomainError>;

    /// Delete an entity. Returns `false` when no such entity existed.
    async fn delete(&self, id: &str) -> Result<bool, DomainError>;

    /// Fetch an entity by id, or `None` if absent.
    async fn get_by_id(&self, id: &str) -> Result<Option<Entity>, DomainError>;
}

/// Writer for directed, typed edges between entities.
#[async_trait]
pub trait RelationshipWriter: Send + Sync {
    /// Create or merge the described edge.
    async fn relate(&self, change: &RelationshipChange) -> Result<(), DomainError>;
}

/// One repository per entity kind, dispatched by a total match.
///
/// The match in [`EntityRepositorySet::for_kind`] is exhaustive, so a new
/// [`EntityKind`] variant cannot compile without a repository slot.
#[derive(Clone)]
pub struct EntityRepositorySet {
    /// Repository for worlds.
    pub worlds: Arc<dyn EntityRepository>,
    /// Repository for campaigns.
    pub campaigns: Arc<dyn EntityRepository>,
    /// Repository for sessions.
    pub sessions: Arc<dyn EntityRepository>,
    /// Repository for characters.
    pub characters: Arc<dyn EntityRepository>,
    /// Repository for locations.
    pub locations: Arc<dyn EntityRepository>,
    /// Repository for items.
    pub items: Arc<dyn EntityRepository>,
    /// Repository for events.
    pub events: Arc<dyn EntityRepository>,
    /// Repository for powers.
    pub powers: Arc<dyn EntityRepository>,
    /// Repository for relationship records.
    pub relationships: Arc<dyn EntityRepository>,
}

impl EntityRepositorySet {
    /// Builds a set where every kind is backed by the same repository.
    /// Production wiring assigns per-kind repositories; tests mostly want one.
    #[must_use]
    pub fn uniform(repository: Arc<dyn EntityRepository>) -> Self {
        Self {
            worlds: Arc::clone(&repository),
            campaigns: Arc::clone(&repository),
            sessions: Arc::clone(&repository),
            characters: Arc::clone(&repository),
            locations: Arc::clone(&repository),
            items: Arc::clone(&repository),
            events: Arc::clone(&repository),
            powers: Arc::clone(&repository),
            relationships: repository,
        }
    }

    /// Resolves the repository for an entity kind. Total over the enum.
    #[must_use]
    pub fn for_kind(&self, kind: EntityKind) -> &dyn EntityRepository {
        match kind {
            EntityKind::World => self.worlds.as_ref(),
            EntityKind::Campaign => self.campaigns.as_ref(),
            EntityKind::Session => self.sessions.as_ref(),
            EntityKind::Character => self.characters.as_ref(),
            EntityKind::Location => self.locations.as_ref(),
            EntityKind::Item => self.items.as_ref(),
            EntityKind::Event => self.events.as_ref(),
            EntityKind::Power => self.powers.as_ref(),
            EntityKind::Relationship => self.relationships.as_ref(),
        }
    }
}

impl std::fmt::Debug for EntityRepositorySet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRepositorySet").finish_non_exhaustive()
    }
}
