//! Relay configuration.

use boardsync_sync::protocol::JOIN_CHUNK_SIZE;
use std::net::{Ipv4Addr, SocketAddr};

pub const DEFAULT_PORT: u16 = 4001;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Records per join chunk.
    pub join_chunk_size: usize,
    /// Address the TCP listener binds to.
    pub bind: SocketAddr,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            join_chunk_size: JOIN_CHUNK_SIZE,
            bind: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
        }
    }
}
