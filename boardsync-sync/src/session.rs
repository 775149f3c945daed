//! Synchronization session: join handshake and steady-state updates.
//!
//! The session is a state machine without I/O of its own. It pushes
//! messages into a [`Channel`] and is fed inbound [`ServerMessage`]s by the
//! owner of the receiving half.
//!
//! ```text
//! Disconnected --join()--> Joining --join-finished--> Joined
//!       ^                                                |
//!       +------------------ disconnected() --------------+
//! ```

use crate::config::SessionConfig;
use crate::error::SyncResult;
use crate::protocol::{self, ActionMessage, ClientMessage, JoinChunk, Progress, ServerMessage};
use crate::queue::TransportQueue;
use crate::transport::Channel;
use boardsync_model::{BoardEvent, GameAssets, Notifier, Replicated};
use boardsync_store::{ConversionReport, EntityStore};
use boardsync_types::{Action, Record, Uid, UidGenerator};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where the session is in the join handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Joining,
    Joined,
}

/// One client's view of a board.
pub struct SyncSession {
    config: SessionConfig,
    pub(crate) store: EntityStore,
    pub(crate) queue: TransportQueue,
    channel: Box<dyn Channel>,
    state: SessionState,
    uids: UidGenerator,
    progress: Progress,
    deferred_deletes: Vec<Record>,
    notifier: Notifier,
}

impl SyncSession {
    pub fn new(config: SessionConfig, channel: Box<dyn Channel>, notifier: Notifier) -> Self {
        Self {
            uids: UidGenerator::new(config.uid_mode),
            store: EntityStore::with_notifier(notifier.clone()),
            queue: TransportQueue::new(),
            channel,
            state: SessionState::Disconnected,
            progress: Progress::default(),
            deferred_deletes: Vec::new(),
            notifier,
            config,
        }
    }

    /// Creates a session and the receiver for its board events.
    pub fn with_events(
        config: SessionConfig,
        channel: Box<dyn Channel>,
    ) -> (Self, mpsc::UnboundedReceiver<BoardEvent>) {
        let (notifier, rx) = Notifier::channel();
        (Self::new(config, channel, notifier), rx)
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_joined(&self) -> bool {
        self.state == SessionState::Joined
    }

    /// Latest join progress reported by the relay.
    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut EntityStore {
        &mut self.store
    }

    pub fn queue(&self) -> &TransportQueue {
        &self.queue
    }

    pub fn queue_mut(&mut self) -> &mut TransportQueue {
        &mut self.queue
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Mints a uid for a locally created entity.
    pub fn next_uid(&self) -> Uid {
        self.uids.next_uid()
    }

    // ── Handshake ───────────────────────────────────────────────

    /// Requests the board snapshot. Ignored unless disconnected.
    pub fn join(&mut self) -> SyncResult<()> {
        if self.state != SessionState::Disconnected {
            warn!("[{}] join() while {:?}, ignoring", self.config.device_name, self.state);
            return Ok(());
        }
        self.channel.send(ClientMessage::Join)?;
        self.state = SessionState::Joining;
        self.progress = Progress::default();
        debug!("[{}] Joining", self.config.device_name);
        Ok(())
    }

    /// The connection dropped. Staged records are discarded; live entities
    /// stay and are updated in place by the next join.
    pub fn disconnected(&mut self) {
        if self.state == SessionState::Disconnected {
            return;
        }
        info!("[{}] Disconnected while {:?}", self.config.device_name, self.state);
        self.state = SessionState::Disconnected;
        self.store.clear_pending();
        self.deferred_deletes.clear();
    }

    /// Decodes one JSON line from the relay and handles it.
    pub fn handle_line(&mut self, line: &str) -> SyncResult<Option<ConversionReport>> {
        let message: ServerMessage = protocol::decode(line)?;
        self.handle_message(message)
    }

    /// Handles one message from the relay.
    ///
    /// Returns the conversion report when the message materialized
    /// entities (join completion, create/update actions).
    pub fn handle_message(&mut self, message: ServerMessage) -> SyncResult<Option<ConversionReport>> {
        match (self.state, message) {
            (SessionState::Disconnected, message) => {
                debug!("Ignoring {} while disconnected", message_name(&message));
                Ok(None)
            }
            (SessionState::Joining, ServerMessage::Join(chunk)) => {
                self.stage_join_chunk(chunk);
                Ok(None)
            }
            (SessionState::Joining, ServerMessage::JoinFinished) => self.finish_join().map(Some),
            (SessionState::Joining, ServerMessage::Action(action)) => {
                self.stage_early_action(action);
                Ok(None)
            }
            (SessionState::Joined, ServerMessage::Action(action)) => Ok(self.apply_action(action)),
            (SessionState::Joined, message) => {
                warn!("Unexpected {} after join, ignoring", message_name(&message));
                Ok(None)
            }
        }
    }

    fn stage_join_chunk(&mut self, chunk: JoinChunk) {
        debug!(
            "Join chunk: {} records ({}/{})",
            chunk.records.len(),
            chunk.progress.sent,
            chunk.progress.total
        );
        self.progress = chunk.progress;
        self.store.queue(chunk.records);
        self.notifier.notify(BoardEvent::JoinProgress {
            sent: chunk.progress.sent,
            total: chunk.progress.total,
        });
    }

    /// Actions that overtake the snapshot join the pending batch; deletes
    /// wait until the snapshot is materialized.
    fn stage_early_action(&mut self, message: ActionMessage) {
        debug!("Staging early {} of {} records", message.action, message.records.len());
        match message.action {
            Action::Create | Action::Update => self.store.queue(message.records),
            Action::Delete => self.deferred_deletes.extend(message.records),
        }
    }

    fn finish_join(&mut self) -> SyncResult<ConversionReport> {
        let report = self.store.convert_queued_entities();
        self.state = SessionState::Joined;

        if !self.deferred_deletes.is_empty() {
            let deletes = std::mem::take(&mut self.deferred_deletes);
            self.apply_deletes(deletes);
        }

        info!(
            "[{}] Joined: {} entities ({} records dropped)",
            self.config.device_name,
            self.store.len(),
            report.failures.len()
        );

        if self.config.ensure_game_assets && self.store.game_assets().is_none() {
            let assets = GameAssets::new(self.next_uid());
            debug!("No game assets in snapshot, creating {}", assets.uid());
            let uid = self.store.add(assets)?;
            if let Some(assets) = self.store.get(&uid) {
                self.queue.queue(assets, Action::Create);
            }
        }

        self.notifier.notify(BoardEvent::JoinFinished);
        self.flush()?;
        Ok(report)
    }

    fn apply_action(&mut self, message: ActionMessage) -> Option<ConversionReport> {
        debug!("Applying {} of {} records", message.action, message.records.len());
        match message.action {
            Action::Create | Action::Update => {
                self.store.queue(message.records);
                Some(self.store.convert_queued_entities())
            }
            Action::Delete => {
                self.apply_deletes(message.records);
                None
            }
        }
    }

    /// Removes remotely deleted entities and cancels any outbound entries
    /// that still reference them.
    fn apply_deletes(&mut self, records: Vec<Record>) {
        self.store.queue(records);
        for action in self.store.remove_queued_entities() {
            for uid in action.uids() {
                self.queue.cancel(uid);
            }
        }
    }

    // ── Outbound ────────────────────────────────────────────────

    /// Sends queued batches. While joining (with `buffer_until_joined`)
    /// nothing is sent and the batches stay queued for the post-join flush.
    ///
    /// Returns the number of messages sent.
    pub fn flush(&mut self) -> SyncResult<usize> {
        if self.config.buffer_until_joined && self.state != SessionState::Joined {
            debug!("Holding {} queued entities until joined", self.queue.len());
            return Ok(0);
        }
        self.queue.flush(&mut self.store, self.channel.as_mut())
    }
}

fn message_name(message: &ServerMessage) -> &'static str {
    match message {
        ServerMessage::Join(_) => "join",
        ServerMessage::JoinFinished => "join-finished",
        ServerMessage::Action(_) => "action",
    }
}
