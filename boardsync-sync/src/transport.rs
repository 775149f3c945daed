//! Channel abstraction.
//!
//! The session only ever pushes [`ClientMessage`]s into a channel; framing,
//! reconnection and delivery are the channel's concern. Inbound messages are
//! fed to the session by whoever owns the receiving half.

use crate::error::{SyncError, SyncResult};
use crate::protocol::ClientMessage;
use tokio::sync::mpsc;

/// Outbound half of a connection to the relay.
pub trait Channel: Send {
    /// Sends a message. Delivery is the channel's responsibility.
    fn send(&mut self, message: ClientMessage) -> SyncResult<()>;
}

impl Channel for mpsc::UnboundedSender<ClientMessage> {
    fn send(&mut self, message: ClientMessage) -> SyncResult<()> {
        mpsc::UnboundedSender::send(self, message).map_err(|_| SyncError::ChannelClosed)
    }
}

/// Mock channel for testing.
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

    /// Records every sent message. Clones share the same buffer, so a test
    /// keeps one clone to inspect and hands the other to the session.
    #[derive(Debug, Clone)]
    pub struct MockChannel {
        sent: Arc<Mutex<VecDeque<ClientMessage>>>,
        connected: Arc<AtomicBool>,
    }

    impl Default for MockChannel {
        fn default() -> Self {
            Self::new()
        }
    }

    impl MockChannel {
        pub fn new() -> Self {
            Self {
                sent: Arc::new(Mutex::new(VecDeque::new())),
                connected: Arc::new(AtomicBool::new(true)),
            }
        }

        fn sent(&self) -> MutexGuard<'_, VecDeque<ClientMessage>> {
            self.sent.lock().unwrap_or_else(PoisonError::into_inner)
        }

        /// Drains everything sent so far.
        pub fn take_sent(&self) -> Vec<ClientMessage> {
            self.sent().drain(..).collect()
        }

        /// Number of messages sent and not yet taken.
        pub fn sent_count(&self) -> usize {
            self.sent().len()
        }

        /// Makes every further send fail with [`SyncError::ChannelClosed`].
        pub fn close(&self) {
            self.connected.store(false, Ordering::SeqCst);
        }

        pub fn reopen(&self) {
            self.connected.store(true, Ordering::SeqCst);
        }

        pub fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }

    impl Channel for MockChannel {
        fn send(&mut self, message: ClientMessage) -> SyncResult<()> {
            if !self.is_connected() {
                return Err(SyncError::ChannelClosed);
            }
            self.sent().push_back(message);
            Ok(())
        }
    }
}
