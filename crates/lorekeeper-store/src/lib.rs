//! Lorekeeper Store — PostgreSQL implementations of the store traits.
//!
//! Proposals and templates are persisted as JSONB documents with a handful
//! of filterable columns; entities live in a generic per-kind document table
//! with a separate edge table for relationships.

pub mod entity_repository;
pub mod proposal_store;
pub mod schema;
pub mod template_store;

pub use entity_repository::{PgEntityRepository, PgRelationshipWriter};
pub use proposal_store::PgProposalStore;
pub use schema::ensure_schema;
pub use template_store::PgTemplateStore;
