//! Error types for the sync layer.

use boardsync_model::ModelError;
use boardsync_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur in sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Entity store error (unresolved dependency, missing entity, ...).
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Entity serialization or application error.
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Protocol error (invalid or unexpected message).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Channel closed.
    #[error("channel closed")]
    ChannelClosed,

    /// An image could not be loaded.
    #[error("failed to load asset {url}: {reason}")]
    AssetLoad { url: String, reason: String },
}
