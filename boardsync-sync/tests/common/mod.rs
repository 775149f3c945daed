//! Shared helpers for sync tests.

#![allow(dead_code)]

use boardsync_model::Notifier;
use boardsync_sync::transport::mock::MockChannel;
use boardsync_sync::{ActionMessage, ClientMessage, ServerMessage, SessionConfig, SyncSession};
use boardsync_types::{Action, Record};
use serde_json::json;

pub fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

pub fn config() -> SessionConfig {
    SessionConfig {
        ensure_game_assets: false,
        ..SessionConfig::sequential()
    }
}

pub fn session() -> (SyncSession, MockChannel) {
    let channel = MockChannel::new();
    let session = SyncSession::new(config(), Box::new(channel.clone()), Notifier::disabled());
    (session, channel)
}

/// A session that completed an empty join, with the sent buffer drained.
pub fn joined_session() -> (SyncSession, MockChannel) {
    let (mut session, channel) = session();
    session.join().unwrap();
    session.handle_message(ServerMessage::JoinFinished).unwrap();
    channel.take_sent();
    (session, channel)
}

pub fn action(action: Action, records: Vec<Record>) -> ServerMessage {
    ServerMessage::Action(ActionMessage::new(action, records))
}

/// The action messages among `sent`, as (action, uids) pairs.
pub fn sent_actions(sent: &[ClientMessage]) -> Vec<(Action, Vec<String>)> {
    sent.iter()
        .filter_map(|m| match m {
            ClientMessage::Action(a) => Some((
                a.action,
                a.records.iter().map(|r| r.uid.as_str().to_string()).collect(),
            )),
            ClientMessage::Join => None,
        })
        .collect()
}

pub fn grid(uid: &str, ts: i64) -> Record {
    record(json!({"kind": "Grid", "uid": uid, "timestamp": ts}))
}

pub fn scene(uid: &str, grid_uid: &str, ts: i64) -> Record {
    record(json!({"kind": "Scene", "uid": uid, "timestamp": ts, "name": "Hall", "gridUid": grid_uid}))
}

pub fn decoration_data(uid: &str, ts: i64) -> Record {
    record(json!({"kind": "DecorationTokenData", "uid": uid, "timestamp": ts, "name": "Barrel"}))
}

pub fn decoration_token(uid: &str, scene_uid: &str, data_uid: &str, ts: i64, x: f64) -> Record {
    record(json!({
        "kind": "DecorationToken",
        "uid": uid,
        "timestamp": ts,
        "sceneUid": scene_uid,
        "tokenDataUid": data_uid,
        "position": {"x": x, "y": 0.0},
    }))
}
