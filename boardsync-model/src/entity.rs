//! The replication contract shared by every entity kind.

use crate::delete::{DeleteAction, DeleteScope};
use crate::error::{ModelError, ModelResult};
use boardsync_types::{AttributeMap, EntityKind, Record, Timestamp, Uid};
use serde::Serialize;
use std::fmt;

/// A synchronizable game object.
///
/// Implementors hold their own fields; the record envelope (kind, uid,
/// timestamp) is assembled by [`Replicated::to_record`].
pub trait Replicated: fmt::Debug + Send {
    /// Kind tag; constant for a given concrete type.
    fn kind(&self) -> EntityKind;

    /// The entity's uid.
    fn uid(&self) -> &Uid;

    /// Snapshot of the current replicated fields.
    fn attributes(&self) -> ModelResult<AttributeMap>;

    /// Overwrites fields from a remote record and re-derives dependent
    /// state. Must set [`Replicated::last_applied`] to the record's
    /// timestamp before returning.
    fn apply_remote_change(&mut self, record: &Record) -> ModelResult<()>;

    /// Timestamp of the last change applied, remote or written locally;
    /// `None` if never.
    fn last_applied(&self) -> Option<Timestamp>;

    /// Records that this client sent the entity's state at `timestamp`, so
    /// remote changes older than the local write are rejected.
    fn mark_written(&mut self, timestamp: Timestamp);

    /// Last-write-wins gate for [`Replicated::apply_remote_change`].
    fn should_apply_change(&self, record: &Record) -> bool {
        should_apply_change(self.last_applied(), record)
    }

    /// Accumulates everything that must be removed together with this
    /// entity, and the cleanup to run afterwards.
    fn delete_action(&self, scope: &DeleteScope<'_>, action: &mut DeleteAction) {
        scope.accumulate(self.uid(), self.kind(), action);
    }

    /// Image URLs this entity keeps loaded.
    fn asset_urls(&self) -> Vec<String> {
        Vec::new()
    }

    /// Local-only scaffolding (drag previews) never leaves the client.
    fn is_local_only(&self) -> bool {
        false
    }

    /// Serializes with the current wall-clock time.
    fn to_record(&self) -> ModelResult<Record> {
        self.to_record_at(Timestamp::now())
    }

    /// Serializes with an explicit write timestamp.
    fn to_record_at(&self, timestamp: Timestamp) -> ModelResult<Record> {
        Ok(Record::new(
            self.kind(),
            self.uid().clone(),
            timestamp,
            self.attributes()?,
        ))
    }
}

/// Last-write-wins: a record applies iff nothing was applied yet, or its
/// timestamp is strictly newer than the last applied one.
///
/// Equal timestamps do not apply, which makes re-delivery of the same
/// record a no-op.
#[must_use]
pub fn should_apply_change(last_applied: Option<Timestamp>, record: &Record) -> bool {
    match last_applied {
        None => true,
        Some(last) => record.timestamp > last,
    }
}

/// Timestamp for a local write made at `now`: strictly newer than
/// anything already applied, so the write wins locally and on every peer.
#[must_use]
pub fn write_timestamp(last_applied: Option<Timestamp>, now: Timestamp) -> Timestamp {
    match last_applied {
        Some(last) if now <= last => Timestamp::from_millis(last.as_millis().saturating_add(1)),
        _ => now,
    }
}

/// Serializes a typed attribute struct to a flat map.
pub fn to_attribute_map<T: Serialize>(attributes: &T) -> ModelResult<AttributeMap> {
    match serde_json::to_value(attributes)? {
        serde_json::Value::Object(map) => Ok(map),
        serde_json::Value::Null => Ok(AttributeMap::new()),
        other => Err(ModelError::Serialization(serde::ser::Error::custom(format!(
            "attributes must serialize to an object, got {other}"
        )))),
    }
}

pub(crate) fn ensure_kind(entity_kind: &EntityKind, record: &Record) -> ModelResult<()> {
    if entity_kind != &record.kind {
        return Err(ModelError::KindMismatch {
            expected: entity_kind.clone(),
            actual: record.kind.clone(),
        });
    }
    Ok(())
}
