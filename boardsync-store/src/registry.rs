//! Kind registry: kind name → (creation priority, converter).
//!
//! Priorities form a dense sequence `0..len`. Inserting at an occupied
//! priority shifts every entry at or above it up by one, so the priority is
//! always usable as a stable sort key for a pending batch.

use crate::converters;
use crate::error::StoreResult;
use crate::store::{Conversion, EntityStore};
use boardsync_types::{EntityKind, Record};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Reconstructs (or updates) an entity from a record.
pub type Converter =
    Arc<dyn Fn(&mut EntityStore, &Record) -> StoreResult<Conversion> + Send + Sync>;

struct KindEntry {
    priority: usize,
    converter: Converter,
}

/// Maps kinds to converters and creation priorities.
#[derive(Default)]
pub struct KindRegistry {
    kinds: HashMap<EntityKind, KindEntry>,
}

impl KindRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding every built-in kind in dependency order.
    pub fn with_builtin_kinds() -> Self {
        let mut registry = Self::new();
        for (kind, converter) in converters::builtin() {
            registry.register(kind, converter);
        }
        registry
    }

    /// Registers a kind after every existing one. Returns its priority.
    ///
    /// Re-registering a kind replaces its converter and moves it last.
    pub fn register<F>(&mut self, kind: impl Into<EntityKind>, converter: F) -> usize
    where
        F: Fn(&mut EntityStore, &Record) -> StoreResult<Conversion> + Send + Sync + 'static,
    {
        let kind = kind.into();
        self.unregister(&kind);
        let priority = self.kinds.len();
        self.insert(kind, priority, Arc::new(converter))
    }

    /// Registers a kind at an explicit priority, shifting every kind at or
    /// above it up by one. Priorities past the end are clamped to the end.
    pub fn register_with_priority<F>(
        &mut self,
        kind: impl Into<EntityKind>,
        priority: usize,
        converter: F,
    ) -> usize
    where
        F: Fn(&mut EntityStore, &Record) -> StoreResult<Conversion> + Send + Sync + 'static,
    {
        let kind = kind.into();
        self.unregister(&kind);
        let priority = priority.min(self.kinds.len());
        for entry in self.kinds.values_mut() {
            if entry.priority >= priority {
                entry.priority += 1;
            }
        }
        self.insert(kind, priority, Arc::new(converter))
    }

    fn insert(&mut self, kind: EntityKind, priority: usize, converter: Converter) -> usize {
        self.kinds.insert(kind, KindEntry { priority, converter });
        priority
    }

    /// Removes a kind, closing the gap it leaves. Returns false if absent.
    pub fn unregister(&mut self, kind: &EntityKind) -> bool {
        let Some(removed) = self.kinds.remove(kind) else {
            return false;
        };
        for entry in self.kinds.values_mut() {
            if entry.priority > removed.priority {
                entry.priority -= 1;
            }
        }
        true
    }

    pub fn priority(&self, kind: &EntityKind) -> Option<usize> {
        self.kinds.get(kind).map(|e| e.priority)
    }

    /// Sort key for batch conversion. Unknown kinds sort last.
    pub fn sort_key(&self, kind: &EntityKind) -> usize {
        self.priority(kind).unwrap_or(usize::MAX)
    }

    pub fn converter(&self, kind: &EntityKind) -> Option<Converter> {
        self.kinds.get(kind).map(|e| Arc::clone(&e.converter))
    }

    pub fn contains(&self, kind: &EntityKind) -> bool {
        self.kinds.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// Registered kinds by ascending priority.
    pub fn kinds_in_order(&self) -> Vec<EntityKind> {
        let mut kinds: Vec<(&EntityKind, usize)> =
            self.kinds.iter().map(|(k, e)| (k, e.priority)).collect();
        kinds.sort_by_key(|(_, priority)| *priority);
        kinds.into_iter().map(|(k, _)| k.clone()).collect()
    }

    /// Stable-sorts records by kind priority.
    pub fn sort_records(&self, records: &mut [Record]) {
        records.sort_by_key(|record| self.sort_key(&record.kind));
    }
}

impl fmt::Debug for KindRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KindRegistry")
            .field("kinds", &self.kinds_in_order())
            .finish()
    }
}
