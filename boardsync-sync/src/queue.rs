//! Outbound batching.
//!
//! The queue is an ordered list of `{action, entities}` groups. Queuing an
//! entity with the same action as the last group appends to it; any other
//! action opens a new group. Flushing sends one action message per group,
//! in order.
//!
//! Entities are queued by reference (uid and kind) and serialized at flush
//! time, so several edits to one entity before a flush send its latest
//! state once. Serializing a create or update stamps the live entity with
//! the write timestamp, so the local write takes part in last-write-wins.

use crate::error::SyncResult;
use crate::protocol::{ActionMessage, ClientMessage};
use crate::transport::Channel;
use boardsync_model::{Replicated, write_timestamp};
use boardsync_store::EntityStore;
use boardsync_types::{Action, EntityKind, Record, Timestamp, Uid};
use std::collections::HashSet;
use tracing::{debug, trace, warn};

/// A queued reference to an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedEntity {
    pub uid: Uid,
    pub kind: EntityKind,
}

/// Consecutive entities sharing one action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueGroup {
    pub action: Action,
    pub entities: Vec<QueuedEntity>,
}

/// Outbound mutations awaiting a flush.
#[derive(Debug, Default)]
pub struct TransportQueue {
    groups: Vec<QueueGroup>,
}

impl TransportQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an entity. Local-only entities are refused (returns false).
    pub fn queue(&mut self, entity: &dyn Replicated, action: Action) -> bool {
        if entity.is_local_only() {
            trace!("Not queuing local-only {} {}", entity.kind(), entity.uid());
            return false;
        }
        self.queue_uid(entity.uid().clone(), entity.kind(), action);
        true
    }

    /// Queues an entity by reference; used for deletes, whose entity is
    /// already gone from the store.
    pub fn queue_uid(&mut self, uid: Uid, kind: EntityKind, action: Action) {
        let entry = QueuedEntity { uid, kind };
        match self.groups.last_mut() {
            Some(group) if group.action == action => group.entities.push(entry),
            _ => self.groups.push(QueueGroup {
                action,
                entities: vec![entry],
            }),
        }
    }

    pub fn groups(&self) -> &[QueueGroup] {
        &self.groups
    }

    /// Number of queued entity references.
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.entities.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Drops every group of `action`. Returns the number of references
    /// dropped.
    pub fn clear(&mut self, action: Action) -> usize {
        let before = self.len();
        self.groups.retain(|g| g.action != action);
        self.coalesce();
        before - self.len()
    }

    /// Drops every reference to `uid`, whatever its action.
    pub fn cancel(&mut self, uid: &Uid) -> usize {
        let before = self.len();
        for group in &mut self.groups {
            group.entities.retain(|e| &e.uid != uid);
        }
        self.groups.retain(|g| !g.entities.is_empty());
        self.coalesce();
        before - self.len()
    }

    /// True if `uid` is queued under `action`.
    pub fn contains(&self, uid: &Uid, action: Action) -> bool {
        self.groups
            .iter()
            .filter(|g| g.action == action)
            .any(|g| g.entities.iter().any(|e| &e.uid == uid))
    }

    pub fn clear_all(&mut self) {
        self.groups.clear();
    }

    /// Merges neighbouring groups that share an action after removals.
    fn coalesce(&mut self) {
        let groups = std::mem::take(&mut self.groups);
        for group in groups {
            match self.groups.last_mut() {
                Some(last) if last.action == group.action => last.entities.extend(group.entities),
                _ => self.groups.push(group),
            }
        }
    }

    /// Sends one action message per group, in order, and empties the queue.
    ///
    /// Create and update references are serialized from the store as of
    /// now, each stamped strictly newer than the last change its entity
    /// applied; references to entities no longer in the store are skipped.
    /// A group that ends up empty sends nothing. On a send error the failed
    /// group and everything after it stay queued.
    pub fn flush(&mut self, store: &mut EntityStore, channel: &mut dyn Channel) -> SyncResult<usize> {
        let now = Timestamp::now();
        let mut groups = std::mem::take(&mut self.groups).into_iter();
        let mut sent = 0;

        while let Some(group) = groups.next() {
            let records = Self::records_for(&group, store, now);
            if records.is_empty() {
                continue;
            }
            let count = records.len();
            let message = ClientMessage::Action(ActionMessage::new(group.action, records));
            if let Err(e) = channel.send(message) {
                warn!("Flush stopped at {} group: {}", group.action, e);
                self.groups = std::iter::once(group).chain(groups).collect();
                return Err(e);
            }
            debug!("Sent {} {} records", count, group.action);
            sent += 1;
        }
        Ok(sent)
    }

    fn records_for(group: &QueueGroup, store: &mut EntityStore, now: Timestamp) -> Vec<Record> {
        let mut seen = HashSet::new();
        let mut records = Vec::with_capacity(group.entities.len());
        for entry in &group.entities {
            if !seen.insert(&entry.uid) {
                continue;
            }
            if group.action == Action::Delete {
                records.push(Record::tombstone(entry.kind.clone(), entry.uid.clone()));
                continue;
            }
            let Some(entity) = store.get_mut(&entry.uid) else {
                debug!("Skipping {} of removed {} {}", group.action, entry.kind, entry.uid);
                continue;
            };
            let timestamp = write_timestamp(entity.last_applied(), now);
            match entity.to_record_at(timestamp) {
                Ok(record) => {
                    entity.mark_written(timestamp);
                    records.push(record);
                }
                Err(e) => warn!("Cannot serialize {} {}: {}", entry.kind, entry.uid, e),
            }
        }
        records
    }
}
