//! Store database schema.

use lorekeeper_core::error::DomainError;
use sqlx::PgPool;

/// SQL to create the proposals table.
pub const CREATE_PROPOSALS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS proposals (
    id          UUID PRIMARY KEY,
    status      VARCHAR(16) NOT NULL,
    change_type VARCHAR(16) NOT NULL,
    entity_kind VARCHAR(32) NOT NULL,
    created_by  VARCHAR(255) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    document    JSONB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_proposals_status ON proposals (status);
CREATE INDEX IF NOT EXISTS idx_proposals_entity_kind ON proposals (entity_kind);
CREATE INDEX IF NOT EXISTS idx_proposals_created_at ON proposals (created_at);
";

/// SQL to create the templates table.
pub const CREATE_TEMPLATES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS proposal_templates (
    id          UUID PRIMARY KEY,
    entity_kind VARCHAR(32) NOT NULL,
    created_at  TIMESTAMPTZ NOT NULL,
    document    JSONB NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_templates_entity_kind ON proposal_templates (entity_kind);
";

/// SQL to create the entity document table.
pub const CREATE_ENTITIES_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS entities (
    id         VARCHAR(64) PRIMARY KEY,
    kind       VARCHAR(32) NOT NULL,
    attributes JSONB NOT NULL DEFAULT '{}'::jsonb
);

CREATE INDEX IF NOT EXISTS idx_entities_kind ON entities (kind);
";

/// SQL to create the relationship edge table.
pub const CREATE_RELATIONSHIPS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS relationships (
    source_id         VARCHAR(64) NOT NULL,
    source_kind       VARCHAR(32) NOT NULL,
    target_id         VARCHAR(64) NOT NULL,
    target_kind       VARCHAR(32) NOT NULL,
    relationship_type VARCHAR(64) NOT NULL,
    properties        JSONB NOT NULL DEFAULT '{}'::jsonb,
    PRIMARY KEY (source_id, target_id, relationship_type)
);
";

/// Applies the schema idempotently at startup.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if any statement fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DomainError> {
    for statement in [
        CREATE_PROPOSALS_TABLE,
        CREATE_TEMPLATES_TABLE,
        CREATE_ENTITIES_TABLE,
        CREATE_RELATIONSHIPS_TABLE,
    ] {
        sqlx::raw_sql(statement)
            .execute(pool)
            .await
            .map_err(|e| DomainError::Infrastructure(format!("schema setup failed: {e}")))?;
    }
    Ok(())
}
