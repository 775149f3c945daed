//! Delete closures.
//!
//! Removing an entity can take others with it: a Scene owns its Grid and
//! Tokens, TokenData takes the Tokens that display it. [`DeleteAction`]
//! separates "what must die" (the accumulator) from "how to clean it up"
//! (callbacks), so callers can sequence cleanup relative to a network
//! flush.

use crate::board_entity::BoardEntity;
use crate::event::{BoardEvent, Notifier};
use boardsync_types::{EntityKind, Uid};
use std::collections::HashSet;
use std::fmt;

/// A deferred cleanup step.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// Read-only view of the live entity graph.
pub trait EntityLookup {
    /// Looks up a live entity.
    fn lookup(&self, uid: &Uid) -> Option<&BoardEntity>;

    /// Iterates all live entities, in no particular order.
    fn entities(&self) -> Box<dyn Iterator<Item = &BoardEntity> + '_>;
}

/// Context passed to [`Replicated::delete_action`](crate::Replicated::delete_action).
pub struct DeleteScope<'a> {
    lookup: &'a dyn EntityLookup,
    notifier: &'a Notifier,
}

impl<'a> DeleteScope<'a> {
    pub fn new(lookup: &'a dyn EntityLookup, notifier: &'a Notifier) -> Self {
        Self { lookup, notifier }
    }

    /// Looks up a live entity.
    pub fn lookup(&self, uid: &Uid) -> Option<&'a BoardEntity> {
        let lookup: &'a dyn EntityLookup = self.lookup;
        lookup.lookup(uid)
    }

    /// All live entities.
    pub fn entities(&self) -> impl Iterator<Item = &'a BoardEntity> + 'a {
        let lookup: &'a dyn EntityLookup = self.lookup;
        lookup.entities()
    }

    /// Adds an entity to the accumulator along with its standard cleanup
    /// (a [`BoardEvent::CleanedUp`] notification).
    ///
    /// Returns false if the entity was already accumulated; callers must
    /// not recurse into it again.
    pub fn accumulate(&self, uid: &Uid, kind: EntityKind, action: &mut DeleteAction) -> bool {
        if !action.push(uid.clone(), kind.clone()) {
            return false;
        }
        let notifier = self.notifier.clone();
        let uid = uid.clone();
        action.add_cleanup(Box::new(move || {
            notifier.notify(BoardEvent::CleanedUp { uid, kind });
        }));
        true
    }

    /// Recurses into another entity's closure, if it is still live.
    pub fn cascade(&self, uid: &Uid, action: &mut DeleteAction) {
        if let Some(entity) = self.lookup(uid) {
            crate::Replicated::delete_action(entity, self, action);
        }
    }
}

/// The result of computing (and then performing) a removal.
#[derive(Default)]
pub struct DeleteAction {
    acc: Vec<(Uid, EntityKind)>,
    seen: HashSet<Uid>,
    cleanup_callbacks: Vec<Cleanup>,
    removed: Vec<BoardEntity>,
}

impl DeleteAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an entity to the accumulator. Returns false on duplicates.
    pub fn push(&mut self, uid: Uid, kind: EntityKind) -> bool {
        if !self.seen.insert(uid.clone()) {
            return false;
        }
        self.acc.push((uid, kind));
        true
    }

    /// Entities to remove, in discovery order (root first).
    pub fn acc(&self) -> &[(Uid, EntityKind)] {
        &self.acc
    }

    /// Uids in the accumulator.
    pub fn uids(&self) -> impl Iterator<Item = &Uid> {
        self.acc.iter().map(|(uid, _)| uid)
    }

    pub fn contains(&self, uid: &Uid) -> bool {
        self.seen.contains(uid)
    }

    pub fn len(&self) -> usize {
        self.acc.len()
    }

    pub fn is_empty(&self) -> bool {
        self.acc.is_empty()
    }

    /// Queues a cleanup callback.
    pub fn add_cleanup(&mut self, cleanup: Cleanup) {
        self.cleanup_callbacks.push(cleanup);
    }

    /// Number of cleanup callbacks still pending.
    pub fn pending_cleanups(&self) -> usize {
        self.cleanup_callbacks.len()
    }

    /// Runs and drains every cleanup callback. Calling it again is a no-op.
    pub fn run_cleanup(&mut self) -> usize {
        let callbacks = std::mem::take(&mut self.cleanup_callbacks);
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }

    /// Records an entity the store took out of its map.
    pub fn record_removed(&mut self, entity: BoardEntity) {
        self.removed.push(entity);
    }

    /// Entities the store removed, in accumulator order.
    pub fn removed(&self) -> &[BoardEntity] {
        &self.removed
    }

    /// Takes ownership of the removed entities.
    pub fn take_removed(&mut self) -> Vec<BoardEntity> {
        std::mem::take(&mut self.removed)
    }
}

impl fmt::Debug for DeleteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeleteAction")
            .field("acc", &self.acc)
            .field("pending_cleanups", &self.cleanup_callbacks.len())
            .field("removed", &self.removed.len())
            .finish()
    }
}
