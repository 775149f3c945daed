//! Core type definitions for boardsync.
//!
//! This crate defines the fundamental, kind-agnostic types used throughout
//! the replication engine:
//! - Entity identifiers (UUID v7, or a sequential counter in dev mode)
//! - Wall-clock write timestamps used for last-write-wins comparison
//! - The uniform [`Record`] envelope every entity serializes to
//!
//! Concrete entity kinds (grids, scenes, tokens, ...) live in
//! `boardsync-model`, not here.

mod ids;
mod record;
mod timestamp;

pub use ids::{Uid, UidGenerator, UidMode};
pub use record::{Action, AttributeMap, EntityKind, Record};
pub use timestamp::Timestamp;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid uid: {0}")]
    InvalidUid(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),
}
