//! Members, rooms and message routing.
//!
//! The hub is plain state: connections hand it decoded messages and it
//! pushes replies into each member's outbound channel. Locking and I/O live
//! in [`server`](crate::server).

use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::room::Room;
use boardsync_sync::{ActionMessage, ClientMessage, ServerMessage};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Connection-scoped member id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MemberId(u64);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "member-{}", self.0)
    }
}

#[derive(Debug)]
struct Member {
    game: String,
    joined: bool,
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl Member {
    fn send(&self, id: MemberId, message: ServerMessage) {
        if self.tx.send(message).is_err() {
            debug!("{} outbound closed, dropping message", id);
        }
    }
}

#[derive(Debug, Default)]
pub struct Hub {
    config: RelayConfig,
    rooms: HashMap<String, Room>,
    members: HashMap<MemberId, Member>,
    next_id: u64,
}

impl Hub {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Registers a connection to `game`. Nothing is sent until it joins.
    pub fn connect(
        &mut self,
        game: impl Into<String>,
        tx: mpsc::UnboundedSender<ServerMessage>,
    ) -> MemberId {
        self.next_id += 1;
        let id = MemberId(self.next_id);
        let game = game.into();
        info!("{} connected to game {}", id, game);
        self.members.insert(
            id,
            Member {
                game,
                joined: false,
                tx,
            },
        );
        id
    }

    /// Forgets a member. The room outlives its members.
    pub fn disconnect(&mut self, id: MemberId) {
        if let Some(member) = self.members.remove(&id) {
            info!("{} left game {}", id, member.game);
        }
    }

    pub fn handle(&mut self, id: MemberId, message: ClientMessage) -> RelayResult<()> {
        match message {
            ClientMessage::Join => self.join(id),
            ClientMessage::Action(action) => self.action(id, action),
        }
    }

    fn join(&mut self, id: MemberId) -> RelayResult<()> {
        let member = self.members.get_mut(&id).ok_or(RelayError::UnknownMember(id))?;
        if member.joined {
            warn!("{} sent a second join, ignoring", id);
            return Ok(());
        }
        member.joined = true;

        let chunks = self
            .rooms
            .get(&member.game)
            .map(|room| room.snapshot_chunks(self.config.join_chunk_size))
            .unwrap_or_default();
        debug!("{} joining {} with {} chunks", id, member.game, chunks.len());
        for chunk in chunks {
            member.send(id, ServerMessage::Join(chunk));
        }
        member.send(id, ServerMessage::JoinFinished);
        Ok(())
    }

    /// Broadcasts to every other joined member of the room, then retains.
    fn action(&mut self, id: MemberId, message: ActionMessage) -> RelayResult<()> {
        let member = self.members.get(&id).ok_or(RelayError::UnknownMember(id))?;
        if !member.joined {
            warn!("{} sent {} before joining, dropping", id, message.action);
            return Ok(());
        }
        let game = member.game.clone();

        let mut recipients = 0;
        for (other_id, other) in &self.members {
            if *other_id != id && other.joined && other.game == game {
                other.send(*other_id, ServerMessage::Action(message.clone()));
                recipients += 1;
            }
        }

        let room = self.rooms.entry(game).or_default();
        let changed = room.apply(message.action, &message.records);
        debug!(
            "{} {} of {} records: {} recipients, {} retained changes",
            id,
            message.action,
            message.records.len(),
            recipients,
            changed
        );
        Ok(())
    }

    pub fn room(&self, game: &str) -> Option<&Room> {
        self.rooms.get(game)
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    pub fn is_joined(&self, id: MemberId) -> bool {
        self.members.get(&id).is_some_and(|m| m.joined)
    }
}
