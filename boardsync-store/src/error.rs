//! Error types for the entity store.

use boardsync_model::ModelError;
use boardsync_types::{EntityKind, Uid};
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while converting records or operating on the graph.
///
/// Conversion errors are contained per record: a batch logs and skips the
/// offending record and carries on.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A record references an entity that is not (yet) in the store.
    #[error("{kind} {uid}: unresolved {field} {target:?}")]
    UnresolvedDependency {
        kind: EntityKind,
        uid: Uid,
        field: &'static str,
        target: Option<Uid>,
    },

    /// No converter is registered for the record's kind.
    #[error("unknown kind {kind} for {uid}")]
    UnknownKind { kind: EntityKind, uid: Uid },

    /// A local operation needs an entity that is not in the store.
    #[error("required {expected} {uid} is not in the store")]
    MissingRequiredEntity { uid: Uid, expected: &'static str },

    /// The uid is live with a different kind than the record carries.
    #[error("{uid} is a {actual}, record says {expected}")]
    KindMismatch {
        uid: Uid,
        expected: EntityKind,
        actual: EntityKind,
    },

    /// The attribute payload does not fit the kind.
    #[error("invalid attributes for {kind} {uid}: {source}")]
    InvalidAttributes {
        kind: EntityKind,
        uid: Uid,
        #[source]
        source: ModelError,
    },

    /// An entity with this uid is already live.
    #[error("duplicate uid {0}")]
    DuplicateUid(Uid),
}

impl StoreError {
    /// The uid of the record or entity the error concerns.
    pub fn uid(&self) -> &Uid {
        match self {
            Self::UnresolvedDependency { uid, .. }
            | Self::UnknownKind { uid, .. }
            | Self::MissingRequiredEntity { uid, .. }
            | Self::KindMismatch { uid, .. }
            | Self::InvalidAttributes { uid, .. }
            | Self::DuplicateUid(uid) => uid,
        }
    }
}
