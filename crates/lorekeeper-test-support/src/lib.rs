//! Shared test mocks and utilities for the Lorekeeper backend.

mod chat;
mod clock;
mod repository;

pub use chat::{FailingChatClient, ScriptedChatClient};
pub use clock::FixedClock;
pub use repository::{
    FailingEntityRepository, RecordedCall, RecordingEntityRepository, RecordingRelationshipWriter,
};
