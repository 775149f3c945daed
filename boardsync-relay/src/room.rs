//! Per-game record retention.

use boardsync_sync::{JoinChunk, Progress};
use boardsync_types::{Action, Record, Uid};
use std::collections::BTreeMap;
use tracing::debug;

/// The newest record for every live uid of one game.
#[derive(Debug, Default, Clone)]
pub struct Room {
    records: BTreeMap<Uid, Record>,
}

impl Room {
    pub fn new() -> Self {
        Self::default()
    }

    /// Retains the records of an action. Creates and updates replace the
    /// stored record unless it is strictly newer; deletes drop the uid.
    ///
    /// Returns how many records changed the room.
    pub fn apply(&mut self, action: Action, records: &[Record]) -> usize {
        let mut changed = 0;
        for record in records {
            match action {
                Action::Create | Action::Update => {
                    let newer = self
                        .records
                        .get(&record.uid)
                        .is_none_or(|stored| record.timestamp >= stored.timestamp);
                    if newer {
                        self.records.insert(record.uid.clone(), record.clone());
                        changed += 1;
                    } else {
                        debug!("Room keeps newer {} {}", record.kind, record.uid);
                    }
                }
                Action::Delete => {
                    if self.records.remove(&record.uid).is_some() {
                        changed += 1;
                    }
                }
            }
        }
        changed
    }

    pub fn get(&self, uid: &Uid) -> Option<&Record> {
        self.records.get(uid)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Every retained record, in uid order.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// The snapshot split into chunks of at most `chunk_size` records, each
    /// carrying cumulative progress. An empty room yields no chunks.
    pub fn snapshot_chunks(&self, chunk_size: usize) -> Vec<JoinChunk> {
        let total = self.records.len();
        let records: Vec<Record> = self.records.values().cloned().collect();
        let mut sent = 0;
        records
            .chunks(chunk_size.max(1))
            .map(|chunk| {
                sent += chunk.len();
                JoinChunk {
                    records: chunk.to_vec(),
                    progress: Progress { sent, total },
                }
            })
            .collect()
    }
}
