//! Shared record builders for store tests.

#![allow(dead_code)]

use boardsync_types::Record;
use serde_json::json;

pub fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

pub fn grid(uid: &str, ts: i64) -> Record {
    record(json!({"kind": "Grid", "uid": uid, "timestamp": ts, "cellSize": 100.0}))
}

pub fn scene(uid: &str, grid_uid: &str, ts: i64) -> Record {
    record(json!({"kind": "Scene", "uid": uid, "timestamp": ts, "name": "Keep", "gridUid": grid_uid}))
}

pub fn character_data(uid: &str, ts: i64) -> Record {
    record(json!({
        "kind": "CharacterTokenData",
        "uid": uid,
        "timestamp": ts,
        "name": format!("hero {uid}"),
        "image": format!("https://img/{uid}.png"),
    }))
}

pub fn empty_data(uid: &str, ts: i64) -> Record {
    record(json!({"kind": "EmptyTokenData", "uid": uid, "timestamp": ts}))
}

pub fn character_token(uid: &str, scene_uid: &str, data_uid: &str, ts: i64, x: f64) -> Record {
    record(json!({
        "kind": "CharacterToken",
        "uid": uid,
        "timestamp": ts,
        "sceneUid": scene_uid,
        "tokenDataUid": data_uid,
        "position": {"x": x, "y": 0.0},
    }))
}

pub fn turn_order(uid: &str, scene_uid: &str, participants: &[&str], ts: i64) -> Record {
    record(json!({
        "kind": "TurnOrder",
        "uid": uid,
        "timestamp": ts,
        "sceneUid": scene_uid,
        "tokenDataUids": participants,
    }))
}

pub fn tombstone(kind: &str, uid: &str) -> Record {
    Record::tombstone(kind, uid.into())
}
