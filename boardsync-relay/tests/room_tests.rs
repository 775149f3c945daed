mod common;

use boardsync_relay::Room;
use boardsync_sync::Progress;
use boardsync_types::{Action, Record, Uid};
use common::*;
use pretty_assertions::assert_eq;

// ── Retention ────────────────────────────────────────────────────

#[test]
fn newer_or_equal_records_replace() {
    let mut room = Room::new();
    room.apply(Action::Create, &[grid_with_cell("g", 10, 50.0)]);
    assert_eq!(room.apply(Action::Update, &[grid_with_cell("g", 10, 60.0)]), 1);
    assert_eq!(room.get(&Uid::from("g")).unwrap().attributes["cellSize"], 60.0);
}

#[test]
fn older_records_are_ignored() {
    let mut room = Room::new();
    room.apply(Action::Create, &[grid_with_cell("g", 10, 50.0)]);
    assert_eq!(room.apply(Action::Update, &[grid_with_cell("g", 9, 10.0)]), 0);
    assert_eq!(room.get(&Uid::from("g")).unwrap().attributes["cellSize"], 50.0);
}

#[test]
fn deletes_drop_the_uid() {
    let mut room = Room::new();
    room.apply(Action::Create, &[grid("a", 1), grid("b", 1)]);
    let changed = room.apply(
        Action::Delete,
        &[
            Record::tombstone("Grid", Uid::from("a")),
            Record::tombstone("Grid", Uid::from("missing")),
        ],
    );
    assert_eq!(changed, 1);
    assert_eq!(room.len(), 1);
    assert!(room.get(&Uid::from("a")).is_none());
}

// ── Snapshot ─────────────────────────────────────────────────────

#[test]
fn snapshot_chunks_carry_cumulative_progress() {
    let mut room = Room::new();
    let records: Vec<Record> = (0..5).map(|i| grid(&format!("g{i}"), 1)).collect();
    room.apply(Action::Create, &records);

    let chunks = room.snapshot_chunks(2);
    let progress: Vec<Progress> = chunks.iter().map(|c| c.progress).collect();
    assert_eq!(
        progress,
        vec![
            Progress { sent: 2, total: 5 },
            Progress { sent: 4, total: 5 },
            Progress { sent: 5, total: 5 },
        ]
    );
    assert!(chunks.last().unwrap().progress.is_complete());
    assert_eq!(chunks.iter().map(|c| c.records.len()).sum::<usize>(), 5);
}

#[test]
fn empty_room_has_no_chunks() {
    assert!(Room::new().snapshot_chunks(50).is_empty());
}

#[test]
fn zero_chunk_size_still_makes_progress() {
    let mut room = Room::new();
    room.apply(Action::Create, &[grid("a", 1), grid("b", 1)]);
    assert_eq!(room.snapshot_chunks(0).len(), 2);
}
