//! `PostgreSQL` implementations of the entity repository and relationship
//! writer, over a generic document table and an edge table.

use async_trait::async_trait;
use lorekeeper_core::entity::{Entity, EntityKind, RelationshipChange};
use lorekeeper_core::error::DomainError;
use lorekeeper_core::repository::{EntityRepository, RelationshipWriter};
use serde_json::{Map, Value};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// PostgreSQL-backed repository for one entity kind.
#[derive(Debug, Clone)]
pub struct PgEntityRepository {
    pool: PgPool,
    kind: EntityKind,
}

impl PgEntityRepository {
    /// Creates a repository scoped to one entity kind.
    #[must_use]
    pub fn new(pool: PgPool, kind: EntityKind) -> Self {
        Self { pool, kind }
    }
}

fn infrastructure(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

fn attributes_from(value: Value) -> Result<Map<String, Value>, DomainError> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(DomainError::Infrastructure(format!(
            "entity attributes column held a non-object: {other}"
        ))),
    }
}

#[async_trait]
impl EntityRepository for PgEntityRepository {
    async fn create(&self, attributes: Map<String, Value>) -> Result<Entity, DomainError> {
        let id = Uuid::new_v4().to_string();
        sqlx::query("INSERT INTO entities (id, kind, attributes) VALUES ($1, $2, $3)")
            .bind(&id)
            .bind(self.kind.as_str())
            .bind(Value::Object(attributes.clone()))
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;

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
        // Merge semantics: only the named attributes are overwritten.
        let row = sqlx::query(
            "UPDATE entities SET attributes = attributes || $3
             WHERE id = $1 AND kind = $2
             RETURNING attributes",
        )
        .bind(id)
        .bind(self.kind.as_str())
        .bind(Value::Object(attributes))
        .fetch_optional(&self.pool)
        .await
        .map_err(infrastructure)?;

        let row = row.ok_or_else(|| DomainError::NotFound("entity", id.to_owned()))?;
        Ok(Entity {
            id: id.to_owned(),
            kind: self.kind,
            attributes: attributes_from(row.get::<Value, _>("attributes"))?,
        })
    }

    async fn delete(&self, id: &str) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM entities WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(self.kind.as_str())
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Entity>, DomainError> {
        let row = sqlx::query("SELECT attributes FROM entities WHERE id = $1 AND kind = $2")
            .bind(id)
            .bind(self.kind.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;

        row.map(|r| {
            Ok(Entity {
                id: id.to_owned(),
                kind: self.kind,
                attributes: attributes_from(r.get::<Value, _>("attributes"))?,
            })
        })
        .transpose()
    }
}

/// PostgreSQL-backed edge writer. Edges are keyed by (source, target, type);
/// re-relating merges the new properties over the old.
#[derive(Debug, Clone)]
pub struct PgRelationshipWriter {
    pool: PgPool,
}

impl PgRelationshipWriter {
    /// Creates a new `PgRelationshipWriter`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RelationshipWriter for PgRelationshipWriter {
    async fn relate(&self, change: &RelationshipChange) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO relationships
                 (source_id, source_kind, target_id, target_kind, relationship_type, properties)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (source_id, target_id, relationship_type)
             DO UPDATE SET properties = relationships.properties || EXCLUDED.properties",
        )
        .bind(&change.source_id)
        .bind(change.source_kind.as_str())
        .bind(&change.target_id)
        .bind(change.target_kind.as_str())
        .bind(&change.relationship_type)
        .bind(Value::Object(change.properties.clone()))
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }
}
