//! The entity store: single owner of the live board graph.
//!
//! Remote records are staged with [`EntityStore::queue`] and materialized by
//! [`EntityStore::convert_queued_entities`] in kind-priority order, so
//! referenced entities exist before their dependents regardless of arrival
//! order. Removal goes through delete closures; see [`EntityStore::remove`].

use crate::assets::AssetRefs;
use crate::error::{StoreError, StoreResult};
use crate::registry::KindRegistry;
use boardsync_model::{
    BoardEntity, BoardEvent, DeleteAction, DeleteScope, EntityLookup, GameAssets, Grid,
    ModelError, Notifier, Replicated, Scene, Token, TokenData, TurnOrder,
};
use boardsync_types::{Record, Uid};
use std::collections::HashMap;
use tracing::{debug, trace, warn};

/// Outcome of converting one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conversion {
    /// A new entity was constructed and registered.
    Created(Uid),
    /// A live entity accepted the record.
    Updated(Uid),
    /// The record was not newer than what the entity last applied.
    Stale(Uid),
}

impl Conversion {
    pub fn uid(&self) -> &Uid {
        match self {
            Self::Created(uid) | Self::Updated(uid) | Self::Stale(uid) => uid,
        }
    }
}

/// Per-record results of a batch conversion.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub outcomes: Vec<Conversion>,
    pub failures: Vec<StoreError>,
}

impl ConversionReport {
    pub fn created(&self) -> impl Iterator<Item = &Uid> {
        self.outcomes.iter().filter_map(|o| match o {
            Conversion::Created(uid) => Some(uid),
            _ => None,
        })
    }

    pub fn updated(&self) -> impl Iterator<Item = &Uid> {
        self.outcomes.iter().filter_map(|o| match o {
            Conversion::Updated(uid) => Some(uid),
            _ => None,
        })
    }

    pub fn stale(&self) -> impl Iterator<Item = &Uid> {
        self.outcomes.iter().filter_map(|o| match o {
            Conversion::Stale(uid) => Some(uid),
            _ => None,
        })
    }

    /// True if no record was dropped.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.outcomes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Owns every live entity of one session.
#[derive(Debug)]
pub struct EntityStore {
    entities: HashMap<Uid, BoardEntity>,
    registry: KindRegistry,
    pending: Vec<Record>,
    assets: AssetRefs,
    notifier: Notifier,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new(KindRegistry::with_builtin_kinds(), Notifier::disabled())
    }
}

impl EntityStore {
    pub fn new(registry: KindRegistry, notifier: Notifier) -> Self {
        Self {
            entities: HashMap::new(),
            registry,
            pending: Vec::new(),
            assets: AssetRefs::new(),
            notifier,
        }
    }

    /// A store with the built-in kinds, publishing to `notifier`.
    pub fn with_notifier(notifier: Notifier) -> Self {
        Self::new(KindRegistry::with_builtin_kinds(), notifier)
    }

    pub fn registry(&self) -> &KindRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut KindRegistry {
        &mut self.registry
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn assets(&self) -> &AssetRefs {
        &self.assets
    }

    // ── Graph access ────────────────────────────────────────────

    /// Registers a live entity.
    pub fn add(&mut self, entity: impl Into<BoardEntity>) -> StoreResult<Uid> {
        let entity = entity.into();
        let uid = entity.uid().clone();
        if self.entities.contains_key(&uid) {
            return Err(StoreError::DuplicateUid(uid));
        }
        for url in entity.asset_urls() {
            self.assets.acquire(&url);
        }
        let kind = entity.kind();
        self.entities.insert(uid.clone(), entity);
        debug!("Added {} {}", kind, uid);
        self.notifier.notify(BoardEvent::Added {
            uid: uid.clone(),
            kind,
        });
        Ok(uid)
    }

    pub fn get(&self, uid: &Uid) -> Option<&BoardEntity> {
        self.entities.get(uid)
    }

    /// Mutable access for local edits. Use [`EntityStore::update_with`] when
    /// the edit may change image URLs.
    pub fn get_mut(&mut self, uid: &Uid) -> Option<&mut BoardEntity> {
        self.entities.get_mut(uid)
    }

    /// Runs a local edit and keeps asset references in step with it.
    pub fn update_with<R>(
        &mut self,
        uid: &Uid,
        edit: impl FnOnce(&mut BoardEntity) -> R,
    ) -> StoreResult<R> {
        let entity = self
            .entities
            .get_mut(uid)
            .ok_or_else(|| StoreError::MissingRequiredEntity {
                uid: uid.clone(),
                expected: "entity",
            })?;
        let before = entity.asset_urls();
        let result = edit(entity);
        let after = entity.asset_urls();
        if before != after {
            self.assets.swap(&before, &after);
        }
        Ok(result)
    }

    pub fn contains(&self, uid: &Uid) -> bool {
        self.entities.contains_key(uid)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoardEntity> {
        self.entities.values()
    }

    /// Live entities by kind priority, then uid. Deterministic; used for
    /// snapshots and tests.
    pub fn sorted_entities(&self) -> Vec<&BoardEntity> {
        let mut entities: Vec<&BoardEntity> = self.entities.values().collect();
        entities.sort_by(|a, b| {
            self.registry
                .sort_key(&a.kind())
                .cmp(&self.registry.sort_key(&b.kind()))
                .then_with(|| a.uid().cmp(b.uid()))
        });
        entities
    }

    pub fn grid(&self, uid: &Uid) -> Option<&Grid> {
        self.get(uid).and_then(BoardEntity::as_grid)
    }

    pub fn scene(&self, uid: &Uid) -> Option<&Scene> {
        self.get(uid).and_then(BoardEntity::as_scene)
    }

    pub fn scene_mut(&mut self, uid: &Uid) -> Option<&mut Scene> {
        self.get_mut(uid).and_then(BoardEntity::as_scene_mut)
    }

    pub fn token(&self, uid: &Uid) -> Option<&Token> {
        self.get(uid).and_then(BoardEntity::as_token)
    }

    pub fn token_data(&self, uid: &Uid) -> Option<&TokenData> {
        self.get(uid).and_then(BoardEntity::as_token_data)
    }

    pub fn turn_order(&self, uid: &Uid) -> Option<&TurnOrder> {
        self.get(uid).and_then(BoardEntity::as_turn_order)
    }

    pub fn turn_order_mut(&mut self, uid: &Uid) -> Option<&mut TurnOrder> {
        self.get_mut(uid).and_then(BoardEntity::as_turn_order_mut)
    }

    /// The game's asset library, if one exists.
    pub fn game_assets(&self) -> Option<&GameAssets> {
        self.sorted_entities()
            .into_iter()
            .find_map(BoardEntity::as_game_assets)
    }

    /// All scenes, sorted by uid.
    pub fn scenes(&self) -> Vec<&Scene> {
        let mut scenes: Vec<&Scene> = self.iter().filter_map(BoardEntity::as_scene).collect();
        scenes.sort_by(|a, b| a.uid().cmp(b.uid()));
        scenes
    }

    /// Tokens attached to a scene, in placement order.
    pub fn tokens_in_scene(&self, scene_uid: &Uid) -> Vec<&Token> {
        self.scene(scene_uid)
            .map(|scene| scene.tokens().iter().filter_map(|t| self.token(t)).collect())
            .unwrap_or_default()
    }

    // ── Removal ─────────────────────────────────────────────────

    /// Removes an entity and everything in its delete closure.
    ///
    /// Every accumulated entity leaves the map before this returns, and
    /// references to it are detached from the survivors. Cleanup callbacks
    /// are NOT run; the caller sequences [`DeleteAction::run_cleanup`].
    pub fn remove(&mut self, uid: &Uid) -> DeleteAction {
        let mut action = DeleteAction::new();
        {
            let scope = DeleteScope::new(&*self, &self.notifier);
            scope.cascade(uid, &mut action);
        }

        let accumulated = action.acc().to_vec();
        for (uid, kind) in accumulated {
            let Some(entity) = self.entities.remove(&uid) else {
                continue;
            };
            self.detach(&entity);

            let urls = entity.asset_urls();
            if !urls.is_empty() {
                let assets = self.assets.clone();
                action.add_cleanup(Box::new(move || {
                    for url in &urls {
                        assets.release(url);
                    }
                }));
            }

            debug!("Removed {} {}", kind, uid);
            self.notifier.notify(BoardEvent::Removed { uid, kind });
            action.record_removed(entity);
        }
        action
    }

    /// Drops references a surviving entity holds to `removed`.
    fn detach(&mut self, removed: &BoardEntity) {
        match removed {
            BoardEntity::Token(token) => {
                if let Some(scene) = self.scene_mut(token.scene_uid()) {
                    scene.detach_token(token.uid());
                }
            }
            BoardEntity::TokenData(data) => {
                for entity in self.entities.values_mut() {
                    if let BoardEntity::TurnOrder(order) = entity {
                        order.remove_participant(data.uid());
                    }
                }
            }
            BoardEntity::TurnOrder(order) => {
                if let Some(scene) = self.scene_mut(order.scene_uid()) {
                    if scene.turn_order() == Some(order.uid()) {
                        scene.set_turn_order(None);
                    }
                }
            }
            BoardEntity::Grid(_)
            | BoardEntity::Scene(_)
            | BoardEntity::GameAssets(_)
            | BoardEntity::Extension(_) => {}
        }
    }

    // ── Inbound staging ─────────────────────────────────────────

    /// Stages records for the next conversion or removal pass.
    pub fn queue(&mut self, records: impl IntoIterator<Item = Record>) {
        let before = self.pending.len();
        self.pending.extend(records);
        trace!("Staged {} records", self.pending.len() - before);
    }

    /// Records staged and not yet processed.
    pub fn pending(&self) -> &[Record] {
        &self.pending
    }

    /// Drops every staged record.
    pub fn clear_pending(&mut self) -> Vec<Record> {
        std::mem::take(&mut self.pending)
    }

    /// Converts every staged record in kind-priority order.
    ///
    /// A record that fails is logged and dropped; the rest of the batch
    /// proceeds.
    pub fn convert_queued_entities(&mut self) -> ConversionReport {
        let mut batch = std::mem::take(&mut self.pending);
        self.registry.sort_records(&mut batch);

        let mut report = ConversionReport::default();
        for record in &batch {
            match self.convert(record) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(err) => {
                    warn!("Dropping {} {}: {}", record.kind, record.uid, err);
                    report.failures.push(err);
                }
            }
        }
        debug!(
            "Converted {} records ({} failed)",
            batch.len(),
            report.failures.len()
        );
        report
    }

    /// Converts a single record through its kind's converter.
    pub fn convert(&mut self, record: &Record) -> StoreResult<Conversion> {
        let converter =
            self.registry
                .converter(&record.kind)
                .ok_or_else(|| StoreError::UnknownKind {
                    kind: record.kind.clone(),
                    uid: record.uid.clone(),
                })?;
        converter(self, record)
    }

    /// Applies staged delete records, dependents first.
    ///
    /// The staged batch is sorted by priority and walked in reverse. Each
    /// record's live entity is removed with its closure and the cleanup runs
    /// immediately. Records for entities that are already gone are skipped.
    pub fn remove_queued_entities(&mut self) -> Vec<DeleteAction> {
        let mut batch = std::mem::take(&mut self.pending);
        self.registry.sort_records(&mut batch);

        let mut actions = Vec::new();
        for record in batch.iter().rev() {
            match self.get(&record.uid) {
                None => {
                    debug!("Delete for absent {} {}", record.kind, record.uid);
                    continue;
                }
                Some(entity) if entity.kind() != record.kind => {
                    warn!(
                        "Delete for {} names kind {}, live entity is {}",
                        record.uid,
                        record.kind,
                        entity.kind()
                    );
                    continue;
                }
                Some(_) => {}
            }
            let mut action = self.remove(&record.uid);
            action.run_cleanup();
            actions.push(action);
        }
        actions
    }

    // ── Converter support ───────────────────────────────────────

    /// Step 1 of every converter: if the uid is live, apply the record in
    /// place when it is newer. `None` means the entity must be constructed.
    pub fn apply_existing(&mut self, record: &Record) -> StoreResult<Option<Conversion>> {
        let Some(entity) = self.entities.get_mut(&record.uid) else {
            return Ok(None);
        };
        let kind = entity.kind();
        if kind != record.kind {
            return Err(StoreError::KindMismatch {
                uid: record.uid.clone(),
                expected: record.kind.clone(),
                actual: kind,
            });
        }
        if !entity.should_apply_change(record) {
            debug!(
                "Stale {} {} at {} (last applied {:?})",
                record.kind,
                record.uid,
                record.timestamp,
                entity.last_applied()
            );
            return Ok(Some(Conversion::Stale(record.uid.clone())));
        }

        let before = entity.asset_urls();
        entity
            .apply_remote_change(record)
            .map_err(|source| invalid_attributes(record, source))?;
        let after = entity.asset_urls();
        if before != after {
            self.assets.swap(&before, &after);
        }
        self.notifier.notify(BoardEvent::Updated {
            uid: record.uid.clone(),
            kind,
        });
        Ok(Some(Conversion::Updated(record.uid.clone())))
    }

    /// Step 3 of every converter: register a freshly constructed entity.
    pub fn insert_converted(&mut self, entity: impl Into<BoardEntity>) -> StoreResult<Conversion> {
        self.add(entity).map(Conversion::Created)
    }
}

impl EntityLookup for EntityStore {
    fn lookup(&self, uid: &Uid) -> Option<&BoardEntity> {
        self.entities.get(uid)
    }

    fn entities(&self) -> Box<dyn Iterator<Item = &BoardEntity> + '_> {
        Box::new(self.entities.values())
    }
}

pub(crate) fn invalid_attributes(record: &Record, source: ModelError) -> StoreError {
    StoreError::InvalidAttributes {
        kind: record.kind.clone(),
        uid: record.uid.clone(),
        source,
    }
}
