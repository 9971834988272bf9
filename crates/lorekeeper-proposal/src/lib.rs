//! Lorekeeper Proposal — the change-proposal lifecycle engine.
//!
//! This crate owns the proposal state machine, the entity-agnostic apply
//! mechanism, and the LLM generation/parsing pipeline that turns free-text
//! model output into structured, appliable change sets.

pub mod application;
pub mod domain;
pub mod store;
pub mod testing;
