//! `PostgreSQL` implementation of the `ProposalStore` trait.

use async_trait::async_trait;
use lorekeeper_core::error::DomainError;
use lorekeeper_proposal::domain::ChangeProposal;
use lorekeeper_proposal::store::{ProposalFilter, ProposalStore};
use sqlx::{PgPool, Row};
use uuid::Uuid;

/// PostgreSQL-backed proposal store. The JSONB document is the source of
/// truth; the extracted columns exist for indexing and coarse filtering.
#[derive(Debug, Clone)]
pub struct PgProposalStore {
    pool: PgPool,
}

impl PgProposalStore {
    /// Creates a new `PgProposalStore`.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn infrastructure(e: sqlx::Error) -> DomainError {
    DomainError::Infrastructure(e.to_string())
}

pub(crate) fn encode_document<T: serde::Serialize>(
    value: &T,
) -> Result<serde_json::Value, DomainError> {
    serde_json::to_value(value)
        .map_err(|e| DomainError::Infrastructure(format!("document encode failed: {e}")))
}

pub(crate) fn decode_document<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> Result<T, DomainError> {
    serde_json::from_value(value)
        .map_err(|e| DomainError::Infrastructure(format!("document decode failed: {e}")))
}

#[async_trait]
impl ProposalStore for PgProposalStore {
    async fn insert(&self, proposal: &ChangeProposal) -> Result<(), DomainError> {
        let document = encode_document(proposal)?;
        sqlx::query(
            "INSERT INTO proposals (id, status, change_type, entity_kind, created_by, created_at, document)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(proposal.id)
        .bind(proposal.status.as_str())
        .bind(proposal.change_type.as_str())
        .bind(proposal.entity_kind.as_str())
        .bind(&proposal.created_by)
        .bind(proposal.created_at)
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;
        Ok(())
    }

    async fn update(&self, proposal: &ChangeProposal) -> Result<(), DomainError> {
        let document = encode_document(proposal)?;
        // Last write wins; there is no version column.
        let result = sqlx::query(
            "UPDATE proposals SET status = $2, change_type = $3, entity_kind = $4, document = $5
             WHERE id = $1",
        )
        .bind(proposal.id)
        .bind(proposal.status.as_str())
        .bind(proposal.change_type.as_str())
        .bind(proposal.entity_kind.as_str())
        .bind(document)
        .execute(&self.pool)
        .await
        .map_err(infrastructure)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound("proposal", proposal.id.to_string()));
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<ChangeProposal>, DomainError> {
        let row = sqlx::query("SELECT document FROM proposals WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(infrastructure)?;

        row.map(|r| decode_document(r.get::<serde_json::Value, _>("document")))
            .transpose()
    }

    async fn list(&self, filter: &ProposalFilter) -> Result<Vec<ChangeProposal>, DomainError> {
        // The indexed columns narrow the scan; the full filter (dates,
        // search, context) runs over the decoded documents.
        let mut sql = String::from("SELECT document FROM proposals WHERE TRUE");
        if filter.status.is_some() {
            sql.push_str(" AND status = $1");
        }
        sql.push_str(" ORDER BY created_at DESC");

        let mut query = sqlx::query(&sql);
        if let Some(status) = filter.status {
            query = query.bind(status.as_str());
        }

        let rows = query.fetch_all(&self.pool).await.map_err(infrastructure)?;

        let mut proposals = Vec::with_capacity(rows.len());
        for row in rows {
            let proposal: ChangeProposal =
                decode_document(row.get::<serde_json::Value, _>("document"))?;
            if filter.matches(&proposal) {
                proposals.push(proposal);
            }
        }
        Ok(proposals)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM proposals WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(infrastructure)?;
        Ok(result.rows_affected() > 0)
    }
}
