//! `PostgreSQL` implementation of the `TemplateStore` trait.

use async_trait::async_trait;
use lorekeeper_core::entity::EntityKind;
use lorekeeper_core::error::DomainError;
use lorekeeper_proposal::domain::ProposalTemplate;
use lorekeeper_proposal::store::TemplateStore;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::proposal_store::{decode_document, encode_document};

/// PostgreSQL-backed template store.
#[derive(Debug, Clone)]
pub struct PgTemplateStore {
    pool: PgPool,
}

impl PgTemplateStore {
    /// Creates a new `PgTemplateStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn infrastructure(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

#[async_trait]
impl TemplateStore for PgTemplateStore {
    async fn insert(&self, template: &ProposalTemplate) -> Result<(), DomainError> {
        let document = encode_document(template)?;
        sqlx::query(
            "INSERT INTO proposal_templates (id, entity_kind, created_at, document)
             VALUES ($1, $2, $3, $4)",
        )
        .bind(template.id)
        .bind(template.entity_kind.as_str())
        .bind(template.created_at)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }

    async fn update(&self, template: &ProposalTemplate) -> Result<(), DomainError> {
        let document = encode_document(template)?;
        let result = sqlx::query(
            "UPDATE proposal_templates SET entity_kind = $2, document = $3 WHERE id = $1",
        )
        .bind(template.id)
        .bind(template.entity_kind.as_str())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("template", template.id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ProposalTemplate>, DomainError> {
        let row = sqlx::query("SELECT document FROM proposal_templates WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;

        row.map(|r| decode_document(r.get::<serde_json::Value, _>("document")))
            .transpose()
    }

    async fn list(
        &self,
        entity_kind: Option<EntityKind>,
    ) -> Result<Vec<ProposalTemplate>, DomainError> {
        // Oldest first so "first template registered for a kind" is stable.
        let rows = match entity_kind {
            Some(kind) => {
                sqlx::query(
                    "SELECT document FROM proposal_templates WHERE entity_kind = $1
                     ORDER BY created_at ASC",
                )
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query("SELECT document FROM proposal_templates ORDER BY created_at ASC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(infrastructure)?;

        rows.into_iter()
            .map(|r| decode_document(r.get::<serde_json::Value, _>("document")))
            .collect()
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM proposal_templates WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(result.rows_affected() > 0)
    }
}
