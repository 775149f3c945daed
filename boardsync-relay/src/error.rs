//! Error types for the relay.

use crate::hub::MemberId;
use boardsync_sync::SyncError;
use thiserror::Error;

pub type RelayResult<T> = Result<T, RelayError>;

#[derive(Debug, Error)]
pub enum RelayError {
    /// Socket error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A line could not be decoded or encoded.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The connection did not open with a hello line.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// A message arrived for a member that already left.
    #[error("unknown member: {0}")]
    UnknownMember(MemberId),
}
