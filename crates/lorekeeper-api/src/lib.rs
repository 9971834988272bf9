//! HTTP surface for the Lorekeeper change proposal engine.

pub mod error;
pub mod routes;
pub mod state;
