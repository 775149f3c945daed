//! Session configuration.

use boardsync_types::UidMode;

/// Configuration for a [`SyncSession`](crate::SyncSession).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How locally created entities get their uids.
    pub uid_mode: UidMode,
    /// Hold outbound batches until the join handshake completes, then
    /// flush them. When false, flushes go out immediately.
    pub buffer_until_joined: bool,
    /// Create the game's asset library after joining if the snapshot had
    /// none.
    pub ensure_game_assets: bool,
    /// Human-readable name for logs.
    pub device_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            uid_mode: UidMode::TimeOrdered,
            buffer_until_joined: true,
            ensure_game_assets: true,
            device_name: "boardsync client".to_string(),
        }
    }
}

impl SessionConfig {
    /// Deterministic uids, for tests and local development.
    pub fn sequential() -> Self {
        Self {
            uid_mode: UidMode::Sequential,
            ..Self::default()
        }
    }
}
