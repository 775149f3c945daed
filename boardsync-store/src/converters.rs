//! Converters for the built-in kinds.
//!
//! Every converter follows the same three steps:
//! 1. if the uid is live, apply the record in place (LWW-gated)
//! 2. otherwise resolve foreign keys, failing with
//!    [`StoreError::UnresolvedDependency`] if one is absent
//! 3. construct, register, and attach to the parent

use crate::error::{StoreError, StoreResult};
use crate::store::{Conversion, EntityStore, invalid_attributes};
use boardsync_model::kinds::{
    CHARACTER_TOKEN, CHARACTER_TOKEN_DATA, DECORATION_TOKEN, DECORATION_TOKEN_DATA,
    EMPTY_TOKEN_DATA, GAME_ASSETS, GRID, SCENE, TURN_ORDER,
};
use boardsync_model::{
    GameAssets, Grid, Replicated, Scene, Token, TokenData, TokenVariant, TurnOrder,
};
use boardsync_types::{Record, Uid};
use tracing::warn;

pub(crate) type ConvertFn = fn(&mut EntityStore, &Record) -> StoreResult<Conversion>;

/// Built-in kinds with their converters, in dependency order.
pub(crate) fn builtin() -> [(&'static str, ConvertFn); 9] {
    [
        (GRID, convert_grid),
        (SCENE, convert_scene),
        (EMPTY_TOKEN_DATA, convert_token_data),
        (CHARACTER_TOKEN_DATA, convert_token_data),
        (DECORATION_TOKEN_DATA, convert_token_data),
        (CHARACTER_TOKEN, convert_token),
        (DECORATION_TOKEN, convert_token),
        (TURN_ORDER, convert_turn_order),
        (GAME_ASSETS, convert_game_assets),
    ]
}

/// Reads a foreign key from a record.
fn reference(record: &Record, field: &'static str) -> StoreResult<Uid> {
    record
        .reference(field)
        .ok_or_else(|| unresolved(record, field, None))
}

fn unresolved(record: &Record, field: &'static str, target: Option<Uid>) -> StoreError {
    StoreError::UnresolvedDependency {
        kind: record.kind.clone(),
        uid: record.uid.clone(),
        field,
        target,
    }
}

pub fn convert_grid(store: &mut EntityStore, record: &Record) -> StoreResult<Conversion> {
    if let Some(outcome) = store.apply_existing(record)? {
        return Ok(outcome);
    }
    let grid = Grid::from_record(record).map_err(|e| invalid_attributes(record, e))?;
    store.insert_converted(grid)
}

pub fn convert_scene(store: &mut EntityStore, record: &Record) -> StoreResult<Conversion> {
    if let Some(outcome) = store.apply_existing(record)? {
        return Ok(outcome);
    }
    let grid_uid = reference(record, "gridUid")?;
    if store.grid(&grid_uid).is_none() {
        return Err(unresolved(record, "gridUid", Some(grid_uid)));
    }
    let scene = Scene::from_record(record, grid_uid).map_err(|e| invalid_attributes(record, e))?;
    store.insert_converted(scene)
}

pub fn convert_token_data(store: &mut EntityStore, record: &Record) -> StoreResult<Conversion> {
    if let Some(outcome) = store.apply_existing(record)? {
        return Ok(outcome);
    }
    let data = TokenData::from_record(record).map_err(|e| invalid_attributes(record, e))?;
    store.insert_converted(data)
}

/// Tokens need their scene and a token data of a kind the variant accepts;
/// the new token is appended to the scene's token list.
pub fn convert_token(store: &mut EntityStore, record: &Record) -> StoreResult<Conversion> {
    if let Some(outcome) = store.apply_existing(record)? {
        return Ok(outcome);
    }
    let variant = TokenVariant::from_kind(&record.kind).ok_or_else(|| StoreError::UnknownKind {
        kind: record.kind.clone(),
        uid: record.uid.clone(),
    })?;

    let scene_uid = reference(record, "sceneUid")?;
    if store.scene(&scene_uid).is_none() {
        return Err(unresolved(record, "sceneUid", Some(scene_uid)));
    }
    let data_uid = reference(record, "tokenDataUid")?;
    match store.token_data(&data_uid) {
        Some(data) if variant.accepts_data(&data.kind()) => {}
        _ => return Err(unresolved(record, "tokenDataUid", Some(data_uid))),
    }

    let token = Token::from_record(record, scene_uid.clone(), data_uid)
        .map_err(|e| invalid_attributes(record, e))?;
    let outcome = store.insert_converted(token)?;
    if let Some(scene) = store.scene_mut(&scene_uid) {
        scene.attach_token(record.uid.clone());
    }
    Ok(outcome)
}

/// A scene holds at most one turn order: attaching a new one removes the
/// previous one from the store. Participants that are not live token data
/// are dropped.
pub fn convert_turn_order(store: &mut EntityStore, record: &Record) -> StoreResult<Conversion> {
    if let Some(outcome) = store.apply_existing(record)? {
        if let Conversion::Updated(uid) = &outcome {
            retain_live_participants(store, uid);
        }
        return Ok(outcome);
    }

    let scene_uid = reference(record, "sceneUid")?;
    if store.scene(&scene_uid).is_none() {
        return Err(unresolved(record, "sceneUid", Some(scene_uid)));
    }
    let requested = TurnOrder::participants_of(record).map_err(|e| invalid_attributes(record, e))?;
    let participants = live_participants(store, record, requested);

    let turn_order = TurnOrder::from_record(record, scene_uid.clone(), participants)
        .map_err(|e| invalid_attributes(record, e))?;
    let outcome = store.insert_converted(turn_order)?;

    let previous = store
        .scene_mut(&scene_uid)
        .and_then(|scene| scene.set_turn_order(Some(record.uid.clone())));
    if let Some(previous) = previous.filter(|p| p != &record.uid) {
        let mut action = store.remove(&previous);
        action.run_cleanup();
    }
    Ok(outcome)
}

fn live_participants(store: &EntityStore, record: &Record, requested: Vec<Uid>) -> Vec<Uid> {
    requested
        .into_iter()
        .filter(|uid| {
            let live = store.token_data(uid).is_some();
            if !live {
                warn!("TurnOrder {} lists unknown token data {}", record.uid, uid);
            }
            live
        })
        .collect()
}

fn retain_live_participants(store: &mut EntityStore, turn_order_uid: &Uid) {
    let Some(order) = store.turn_order(turn_order_uid) else {
        return;
    };
    let dead: Vec<Uid> = order
        .participants()
        .iter()
        .filter(|uid| store.token_data(uid).is_none())
        .cloned()
        .collect();
    if dead.is_empty() {
        return;
    }
    if let Some(order) = store.turn_order_mut(turn_order_uid) {
        for uid in &dead {
            warn!("TurnOrder {} lists unknown token data {}", turn_order_uid, uid);
            order.remove_participant(uid);
        }
    }
}

pub fn convert_game_assets(store: &mut EntityStore, record: &Record) -> StoreResult<Conversion> {
    if let Some(outcome) = store.apply_existing(record)? {
        return Ok(outcome);
    }
    let assets = GameAssets::from_record(record).map_err(|e| invalid_attributes(record, e))?;
    store.insert_converted(assets)
}
