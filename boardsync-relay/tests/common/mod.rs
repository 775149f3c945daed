//! Shared helpers for relay tests.

#![allow(dead_code)]

use boardsync_types::Record;
use serde_json::json;

pub fn record(value: serde_json::Value) -> Record {
    serde_json::from_value(value).unwrap()
}

pub fn grid(uid: &str, ts: i64) -> Record {
    record(json!({"kind": "Grid", "uid": uid, "timestamp": ts}))
}

pub fn grid_with_cell(uid: &str, ts: i64, cell: f64) -> Record {
    record(json!({"kind": "Grid", "uid": uid, "timestamp": ts, "cellSize": cell}))
}
