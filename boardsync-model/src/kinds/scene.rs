use super::{SCENE, unset_reference};
use crate::board_entity::BoardEntity;
use crate::delete::{DeleteAction, DeleteScope};
use crate::entity::{Replicated, ensure_kind, to_attribute_map};
use crate::error::ModelResult;
use boardsync_types::{AttributeMap, EntityKind, Record, Timestamp, Uid};
use serde::{Deserialize, Serialize};

/// A playable map: one grid, the tokens placed on it and an optional
/// turn order.
///
/// Only `name` and `gridUid` are replicated. The token list and turn order
/// are rebuilt locally as dependent records are converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    #[serde(skip)]
    uid: Uid,
    #[serde(default)]
    pub name: String,
    #[serde(default = "unset_reference")]
    grid_uid: Uid,
    #[serde(skip)]
    tokens: Vec<Uid>,
    #[serde(skip)]
    turn_order: Option<Uid>,
    #[serde(skip)]
    last_applied: Option<Timestamp>,
}

impl Scene {
    pub fn new(uid: Uid, name: impl Into<String>, grid_uid: Uid) -> Self {
        Self {
            uid,
            name: name.into(),
            grid_uid,
            tokens: Vec::new(),
            turn_order: None,
            last_applied: None,
        }
    }

    /// Reconstructs a scene from a record whose grid is already resolved.
    pub fn from_record(record: &Record, grid_uid: Uid) -> ModelResult<Self> {
        let mut scene = Self::new(record.uid.clone(), String::new(), grid_uid);
        scene.apply_remote_change(record)?;
        Ok(scene)
    }

    pub fn grid_uid(&self) -> &Uid {
        &self.grid_uid
    }

    /// Tokens placed on this scene, in placement order.
    pub fn tokens(&self) -> &[Uid] {
        &self.tokens
    }

    pub fn has_token(&self, uid: &Uid) -> bool {
        self.tokens.contains(uid)
    }

    /// Places a token. Returns false if it was already attached.
    pub fn attach_token(&mut self, uid: Uid) -> bool {
        if self.has_token(&uid) {
            return false;
        }
        self.tokens.push(uid);
        true
    }

    /// Takes a token off the scene. Returns false if it was not attached.
    pub fn detach_token(&mut self, uid: &Uid) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != uid);
        self.tokens.len() != before
    }

    pub fn turn_order(&self) -> Option<&Uid> {
        self.turn_order.as_ref()
    }

    /// Sets the scene's turn order, returning the one it replaces.
    pub fn set_turn_order(&mut self, turn_order: Option<Uid>) -> Option<Uid> {
        std::mem::replace(&mut self.turn_order, turn_order)
    }
}

impl Replicated for Scene {
    fn kind(&self) -> EntityKind {
        EntityKind::from(SCENE)
    }

    fn uid(&self) -> &Uid {
        &self.uid
    }

    fn attributes(&self) -> ModelResult<AttributeMap> {
        to_attribute_map(self)
    }

    /// Renames the scene. The grid reference is fixed at creation.
    fn apply_remote_change(&mut self, record: &Record) -> ModelResult<()> {
        ensure_kind(&self.kind(), record)?;
        let incoming: Scene = record.attributes_as()?;
        self.name = incoming.name;
        self.last_applied = Some(record.timestamp);
        Ok(())
    }

    fn last_applied(&self) -> Option<Timestamp> {
        self.last_applied
    }

    fn mark_written(&mut self, timestamp: Timestamp) {
        self.last_applied = self.last_applied.max(Some(timestamp));
    }

    fn delete_action(&self, scope: &DeleteScope<'_>, action: &mut DeleteAction) {
        if !scope.accumulate(&self.uid, self.kind(), action) {
            return;
        }
        scope.cascade(&self.grid_uid, action);
        for token in &self.tokens {
            scope.cascade(token, action);
        }
        // Ghosts point at the scene but are never attached to it.
        let mut ghosts: Vec<Uid> = scope
            .entities()
            .filter_map(|entity| match entity {
                BoardEntity::Token(token)
                    if token.scene_uid() == &self.uid && !self.has_token(token.uid()) =>
                {
                    Some(token.uid().clone())
                }
                _ => None,
            })
            .collect();
        ghosts.sort();
        for uid in &ghosts {
            scope.cascade(uid, action);
        }
        if let Some(turn_order) = &self.turn_order {
            scope.cascade(turn_order, action);
        }
    }
}
