//! In-memory relay for boardsync games.
//!
//! The relay is the only server-side piece: it keeps the newest record per
//! uid for each game, hands joining clients a chunked snapshot, and fans
//! actions out to the other members. It never interprets attributes.

pub mod config;
pub mod error;
pub mod hub;
pub mod room;
pub mod server;

pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use hub::{Hub, MemberId};
pub use room::Room;
pub use server::{Hello, SharedHub, serve};
