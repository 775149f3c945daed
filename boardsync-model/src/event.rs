//! Change notifications published to the UI layer.

use boardsync_types::{EntityKind, Uid};
use tokio::sync::mpsc;
use tracing::trace;

/// Something observable happened to the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    /// An entity entered the store.
    Added { uid: Uid, kind: EntityKind },
    /// A remote change was applied to an entity.
    Updated { uid: Uid, kind: EntityKind },
    /// An entity left the store.
    Removed { uid: Uid, kind: EntityKind },
    /// A removed entity's cleanup ran (render nodes detached, assets released).
    CleanedUp { uid: Uid, kind: EntityKind },
    /// A join chunk arrived.
    JoinProgress { sent: usize, total: usize },
    /// The join snapshot has been materialized.
    JoinFinished,
}

impl BoardEvent {
    /// The entity this event concerns, if any.
    pub fn uid(&self) -> Option<&Uid> {
        match self {
            Self::Added { uid, .. }
            | Self::Updated { uid, .. }
            | Self::Removed { uid, .. }
            | Self::CleanedUp { uid, .. } => Some(uid),
            Self::JoinProgress { .. } | Self::JoinFinished => None,
        }
    }
}

/// Sending half of the notification channel.
///
/// A disabled notifier drops every event. Cloning shares the channel.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    tx: Option<mpsc::UnboundedSender<BoardEvent>>,
}

impl Notifier {
    /// Creates a notifier and the receiver the UI layer drains.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<BoardEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx: Some(tx) }, rx)
    }

    /// A notifier with no listener.
    pub fn disabled() -> Self {
        Self { tx: None }
    }

    /// Publishes an event. A dropped receiver is not an error.
    pub fn notify(&self, event: BoardEvent) {
        if let Some(tx) = &self.tx {
            if let Err(err) = tx.send(event) {
                trace!("board event dropped, receiver gone: {:?}", err.0);
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }
}
