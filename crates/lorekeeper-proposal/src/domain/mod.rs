//! Domain types for the Change Proposal context.

pub mod proposal;
pub mod template;

pub use proposal::{
    ChangeField, ChangeProposal, ChangeType, ProposalComment, ProposalDraft, ProposalStatus,
};
pub use template::{ProposalTemplate, TemplateDraft};
