//! Application services for the Change Proposal context.
//!
//! Handlers are free async functions over `&dyn` collaborators: load state,
//! run domain logic, persist, return a view or outcome.

pub mod generator;
pub mod lifecycle;
pub mod parser;
pub mod queries;
pub mod render;
pub mod templates;
