//! Wire protocol between board clients and the relay.
//!
//! Messages are JSON objects tagged by event name, one per line on a
//! stream transport:
//!
//! ```json
//! {"event":"join"}
//! {"event":"join","data":{"records":[...],"progress":{"sent":50,"total":120}}}
//! {"event":"join-finished"}
//! {"event":"action","data":{"action":"create","records":[...]}}
//! ```

use crate::error::{SyncError, SyncResult};
use boardsync_types::{Action, Record};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Number of records per join chunk the relay sends by default.
pub const JOIN_CHUNK_SIZE: usize = 50;

/// Messages a client sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientMessage {
    /// Request the full board state.
    #[serde(rename = "join")]
    Join,

    /// A batch of local mutations.
    #[serde(rename = "action")]
    Action(ActionMessage),
}

/// Messages the relay sends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerMessage {
    /// One chunk of the join snapshot.
    #[serde(rename = "join")]
    Join(JoinChunk),

    /// The snapshot is complete.
    #[serde(rename = "join-finished")]
    JoinFinished,

    /// Another client's mutations.
    #[serde(rename = "action")]
    Action(ActionMessage),
}

/// Records of one action type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionMessage {
    pub action: Action,
    pub records: Vec<Record>,
}

impl ActionMessage {
    pub fn new(action: Action, records: Vec<Record>) -> Self {
        Self { action, records }
    }
}

/// One chunk of a join snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinChunk {
    pub records: Vec<Record>,
    pub progress: Progress,
}

/// Cumulative join progress, in records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub sent: usize,
    pub total: usize,
}

impl Progress {
    pub fn is_complete(&self) -> bool {
        self.sent >= self.total
    }
}

/// Encodes a message as a single JSON line (without the newline).
pub fn encode<T: Serialize>(message: &T) -> SyncResult<String> {
    Ok(serde_json::to_string(message)?)
}

/// Decodes one JSON line.
pub fn decode<T: DeserializeOwned>(line: &str) -> SyncResult<T> {
    let line = line.trim();
    if line.is_empty() {
        return Err(SyncError::Protocol("empty message".into()));
    }
    Ok(serde_json::from_str(line)?)
}
