//! Error types for the entity model.

use boardsync_types::EntityKind;
use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while serializing or applying entity attributes.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The attribute payload did not match the kind's attribute struct.
    #[error("invalid attributes: {0}")]
    Attributes(#[from] boardsync_types::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A record of one kind was applied to an entity of another.
    #[error("kind mismatch: entity is {expected}, record is {actual}")]
    KindMismatch {
        expected: EntityKind,
        actual: EntityKind,
    },

    /// A concrete type was asked to represent a kind it does not cover.
    #[error("unsupported kind: {0}")]
    UnsupportedKind(EntityKind),
}
