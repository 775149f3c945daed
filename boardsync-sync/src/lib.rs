//! Synchronization for boardsync.
//!
//! - [`protocol`]: wire messages (`join`, `join-finished`, `action`)
//! - [`transport`]: the [`Channel`] the session sends through, plus a mock
//! - [`queue`]: outbound batching with same-action coalescing
//! - [`session`]: the join handshake and steady-state update flow
//! - [`board`]: local operations (create scene/token, update, remove)
//! - [`assets`]: async image loading ahead of token creation

pub mod assets;
pub mod board;
pub mod config;
pub mod error;
pub mod protocol;
pub mod queue;
pub mod session;
pub mod transport;

pub use assets::{AssetLoader, AssetManager, TextureHandle};
pub use board::RemovalHooks;
pub use config::SessionConfig;
pub use error::{SyncError, SyncResult};
pub use protocol::{ActionMessage, ClientMessage, JoinChunk, Progress, ServerMessage};
pub use queue::{QueueGroup, QueuedEntity, TransportQueue};
pub use session::{SessionState, SyncSession};
pub use transport::Channel;
