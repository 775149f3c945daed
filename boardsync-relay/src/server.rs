//! TCP front end: newline-delimited JSON.
//!
//! A connection opens with a hello line naming the game, then carries one
//! [`ClientMessage`] per line. Server messages are written back as lines.

use crate::error::{RelayError, RelayResult};
use crate::hub::{Hub, MemberId};
use boardsync_sync::protocol;
use boardsync_sync::{ClientMessage, ServerMessage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

pub type SharedHub = Arc<Mutex<Hub>>;

/// First line of every connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hello {
    pub game: String,
}

/// Accepts connections until the listener fails.
pub async fn serve(listener: TcpListener, hub: SharedHub) -> RelayResult<()> {
    info!("Relay listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = listener.accept().await?;
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, hub).await {
                warn!("Connection from {} ended: {}", peer, e);
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, hub: SharedHub) -> RelayResult<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    let hello = match lines.next_line().await? {
        Some(line) => serde_json::from_str::<Hello>(&line)
            .map_err(|e| RelayError::Handshake(e.to_string()))?,
        None => return Err(RelayError::Handshake("connection closed".into())),
    };

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    let id = hub.lock().await.connect(hello.game, tx);

    let writer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let mut line = protocol::encode(&message)?;
            line.push('\n');
            write_half.write_all(line.as_bytes()).await?;
        }
        Ok::<_, RelayError>(())
    });

    let result = read_messages(id, &mut lines, &hub).await;
    hub.lock().await.disconnect(id);
    writer.abort();
    result
}

async fn read_messages<R>(
    id: MemberId,
    lines: &mut tokio::io::Lines<R>,
    hub: &SharedHub,
) -> RelayResult<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let message: ClientMessage = match protocol::decode(&line) {
            Ok(message) => message,
            Err(e) => {
                warn!("{} sent an undecodable line: {}", id, e);
                continue;
            }
        };
        hub.lock().await.handle(id, message)?;
    }
    debug!("{} closed the connection", id);
    Ok(())
}
