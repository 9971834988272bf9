//! Lorekeeper Core — shared domain abstractions.
//!
//! This crate defines the fundamental traits and types that the proposal
//! engine and its collaborators depend on. It contains no infrastructure code.

pub mod clock;
pub mod entity;
pub mod error;
pub mod repository;
