//! Test repositories — mock entity repository and relationship writer.

use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use lorekeeper_core::entity::{Entity, EntityKind, RelationshipChange};
use lorekeeper_core::error::DomainError;
use lorekeeper_core::repository::{EntityRepository, RelationshipWriter};
use serde_json::{Map, Value};

/// One recorded repository invocation.
#[derive(Debug, Clone)]
pub enum RecordedCall {
    /// `create` with the collapsed attribute document.
    Create(Map<String, Value>),
    /// `update` with target id and attributes.
    Update(String, Map<String, Value>),
    /// `delete` with target id.
    Delete(String),
    /// `get_by_id` with target id.
    Get(String),
}

/// An entity repository that records every call and returns configurable
/// results. Created entities get sequential ids ("generated-1", ...).
pub struct RecordingEntityRepository {
    kind: EntityKind,
    calls: Mutex<Vec<RecordedCall>>,
    next_id: AtomicU64,
    delete_result: Mutex<bool>,
    stored: Mutex<Option<Entity>>,
}

impl RecordingEntityRepository {
    /// Create a repository for one entity kind. Deletes succeed and lookups
    /// return `None` until configured otherwise.
    #[must_use]
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            calls: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            delete_result: Mutex::new(true),
            stored: Mutex::new(None),
        }
    }

    /// Configure what `delete` returns.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_delete_result(&self, result: bool) {
        *self.delete_result.lock().unwrap() = result;
    }

    /// Configure what `get_by_id` returns.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn set_stored(&self, entity: Entity) {
        *self.stored.lock().unwrap() = Some(entity);
    }

    /// Snapshot of all calls made so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EntityRepository for RecordingEntityRepository {
    async fn create(&self, attributes: Map<String, Value>) -> Result<Entity, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Create(attributes.clone()));
        let id = format!("generated-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        Ok(Entity {
            id,
            kind: self.kind,
            attributes,
        })
    }

    async fn update(
        &self,
        id: &str,
        attributes: Map<String, Value>,
    ) -> Result<Entity, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Update(id.to_owned(), attributes.clone()));
        Ok(Entity {
            id: id.to_owned(),
            kind: self.kind,
            attributes,
        })
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Delete(id.to_owned()));
        Ok(*self.delete_result.lock().unwrap())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Entity>, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push(RecordedCall::Get(id.to_owned()));
        Ok(self.stored.lock().unwrap().clone())
    }
}

/// An entity repository whose every method fails with an infrastructure
/// error. Useful for degradation and error-path tests.
#[derive(Debug)]
pub struct FailingEntityRepository;

fn connection_refused() -> DomainError {
    DomainError::Infrastructure("connection refused".to_owned())
}

#[async_trait]
impl EntityRepository for FailingEntityRepository {
    async fn create(&self, _attributes: Map<String, Value>) -> Result<Entity, DomainError> {
        Err(connection_refused())
    }

    async fn update(
        &self,
        _id: &str,
        _attributes: Map<String, Value>,
    ) -> Result<Entity, DomainError> {
        Err(connection_refused())
    }

    async fn delete(&self, _id: &str) -> Result<bool, DomainError> {
        Err(connection_refused())
    }

    async fn get_by_id(&self, _id: &str) -> Result<Option<Entity>, DomainError> {
        Err(connection_refused())
    }
}

/// A relationship writer that records every attempted edge and can be told
/// to fail for particular relationship types.
#[derive(Debug, Default)]
pub struct RecordingRelationshipWriter {
    attempts: Mutex<Vec<RelationshipChange>>,
    failing_types: Mutex<HashSet<String>>,
}

impl RecordingRelationshipWriter {
    /// Create a writer that accepts every edge.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make writes of the given relationship type fail.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn fail_for_type(&self, relationship_type: &str) {
        self.failing_types
            .lock()
            .unwrap()
            .insert(relationship_type.to_owned());
    }

    /// Snapshot of all attempted edges, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn attempts(&self) -> Vec<RelationshipChange> {
        self.attempts.lock().unwrap().clone()
    }
}

#[async_trait]
impl RelationshipWriter for RecordingRelationshipWriter {
    async fn relate(&self, change: &RelationshipChange) -> Result<(), DomainError> {
        self.attempts.lock().unwrap().push(change.clone());
        if self
            .failing_types
            .lock()
            .unwrap()
            .contains(&change.relationship_type)
        {
            return Err(DomainError::Infrastructure(format!(
                "edge write rejected: {}",
                change.relationship_type
            )));
        }
        Ok(())
    }
}
