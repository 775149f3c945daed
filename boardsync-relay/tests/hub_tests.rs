mod common;

use boardsync_relay::{Hub, MemberId, RelayConfig};
use boardsync_sync::{ActionMessage, ClientMessage, ServerMessage};
use boardsync_types::{Action, Uid};
use common::*;
use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

struct Client {
    id: MemberId,
    rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Client {
    fn connect(hub: &mut Hub, game: &str) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = hub.connect(game, tx);
        Self { id, rx }
    }

    fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(message) = self.rx.try_recv() {
            out.push(message);
        }
        out
    }
}

fn hub_with_chunk_size(join_chunk_size: usize) -> Hub {
    Hub::new(RelayConfig {
        join_chunk_size,
        ..RelayConfig::default()
    })
}

fn create(records: Vec<boardsync_types::Record>) -> ClientMessage {
    ClientMessage::Action(ActionMessage::new(Action::Create, records))
}

// ── Join ─────────────────────────────────────────────────────────

#[test]
fn join_to_empty_room_finishes_immediately() {
    let mut hub = Hub::default();
    let mut client = Client::connect(&mut hub, "game");
    hub.handle(client.id, ClientMessage::Join).unwrap();
    assert_eq!(client.drain(), vec![ServerMessage::JoinFinished]);
    assert!(hub.is_joined(client.id));
}

#[test]
fn join_streams_snapshot_in_chunks() {
    let mut hub = hub_with_chunk_size(2);
    let mut writer = Client::connect(&mut hub, "game");
    hub.handle(writer.id, ClientMessage::Join).unwrap();
    hub.handle(writer.id, create(vec![grid("a", 1), grid("b", 1), grid("c", 1)]))
        .unwrap();
    writer.drain();

    let mut reader = Client::connect(&mut hub, "game");
    hub.handle(reader.id, ClientMessage::Join).unwrap();
    let messages = reader.drain();
    assert_eq!(messages.len(), 3);
    match &messages[1] {
        ServerMessage::Join(chunk) => assert!(chunk.progress.is_complete()),
        other => panic!("expected join chunk, got {other:?}"),
    }
    assert_eq!(messages[2], ServerMessage::JoinFinished);
}

#[test]
fn second_join_is_ignored() {
    let mut hub = Hub::default();
    let mut client = Client::connect(&mut hub, "game");
    hub.handle(client.id, ClientMessage::Join).unwrap();
    hub.handle(client.id, ClientMessage::Join).unwrap();
    assert_eq!(client.drain().len(), 1);
}

// ── Actions ──────────────────────────────────────────────────────

#[test]
fn actions_reach_other_joined_members_only() {
    let mut hub = Hub::default();
    let mut sender = Client::connect(&mut hub, "game");
    let mut peer = Client::connect(&mut hub, "game");
    let mut lurker = Client::connect(&mut hub, "game");
    let mut elsewhere = Client::connect(&mut hub, "other");
    for id in [sender.id, peer.id, elsewhere.id] {
        hub.handle(id, ClientMessage::Join).unwrap();
    }
    for client in [&mut sender, &mut peer, &mut lurker, &mut elsewhere] {
        client.drain();
    }

    hub.handle(sender.id, create(vec![grid("g", 1)])).unwrap();

    assert!(sender.drain().is_empty());
    assert!(lurker.drain().is_empty());
    assert!(elsewhere.drain().is_empty());
    assert_eq!(
        peer.drain(),
        vec![ServerMessage::Action(ActionMessage::new(
            Action::Create,
            vec![grid("g", 1)]
        ))]
    );
}

#[test]
fn actions_before_join_are_dropped() {
    let mut hub = Hub::default();
    let client = Client::connect(&mut hub, "game");
    hub.handle(client.id, create(vec![grid("g", 1)])).unwrap();
    assert!(hub.room("game").is_none_or(|room| room.is_empty()));
}

#[test]
fn actions_are_retained_for_later_joiners() {
    let mut hub = Hub::default();
    let first = Client::connect(&mut hub, "game");
    hub.handle(first.id, ClientMessage::Join).unwrap();
    hub.handle(first.id, create(vec![grid("g", 1)])).unwrap();
    hub.handle(
        first.id,
        ClientMessage::Action(ActionMessage::new(
            Action::Update,
            vec![grid_with_cell("g", 2, 64.0)],
        )),
    )
    .unwrap();

    let room = hub.room("game").unwrap();
    assert_eq!(room.len(), 1);
    assert_eq!(room.get(&Uid::from("g")).unwrap().attributes["cellSize"], 64.0);
}

// ── Membership ───────────────────────────────────────────────────

#[test]
fn disconnect_keeps_the_room() {
    let mut hub = Hub::default();
    let client = Client::connect(&mut hub, "game");
    hub.handle(client.id, ClientMessage::Join).unwrap();
    hub.handle(client.id, create(vec![grid("g", 1)])).unwrap();
    hub.disconnect(client.id);

    assert_eq!(hub.member_count(), 0);
    assert_eq!(hub.room("game").unwrap().len(), 1);
    assert!(hub.handle(client.id, ClientMessage::Join).is_err());
}

#[test]
fn closed_outbound_does_not_break_broadcast() {
    let mut hub = Hub::default();
    let sender = Client::connect(&mut hub, "game");
    let gone = Client::connect(&mut hub, "game");
    hub.handle(sender.id, ClientMessage::Join).unwrap();
    hub.handle(gone.id, ClientMessage::Join).unwrap();
    drop(gone.rx);

    hub.handle(sender.id, create(vec![grid("g", 1)])).unwrap();
    assert_eq!(hub.room("game").unwrap().len(), 1);
}
