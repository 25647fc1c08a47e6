//! Per-peer reader and writer tasks over a framed TCP stream.

use std::time::Instant;

use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::wire::{read_frame, write_frame, WireMsg};

/// Capacity of each connection's send queue. Sends are non-blocking and
/// drop when the queue is full.
pub const SEND_QUEUE_CAPACITY: usize = 16;

/// Identifies one connection for its lifetime.
pub type ConnId = u64;

/// Event surfaced to the peering manager by connection tasks.
#[derive(Debug)]
pub enum PeerEvent {
    /// A decoded message from the peer.
    Msg { conn: ConnId, msg: WireMsg },
    /// The connection failed; tear it down.
    RemoveMe { conn: ConnId },
}

/// Handle to one live peer connection.
///
/// The reader task decodes frames and forwards them to the manager's
/// event queue; the writer drains the send queue onto the wire. Either
/// task reports `RemoveMe` on failure and exits.
pub struct Connection {
    pub id: ConnId,
    /// Address the remote advertised in its hello; the peer-table key.
    pub addr: Option<String>,
    /// When the connection was established.
    pub since: Instant,
    send: mpsc::Sender<WireMsg>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Connection {
    pub fn spawn(id: ConnId, stream: TcpStream, events: mpsc::Sender<PeerEvent>) -> Self {
        let (read_half, write_half) = stream.into_split();
        let (send_tx, send_rx) = mpsc::channel(SEND_QUEUE_CAPACITY);
        let reader = tokio::spawn(read_loop(id, read_half, events.clone()));
        let writer = tokio::spawn(write_loop(id, write_half, send_rx, events));
        Self {
            id,
            addr: None,
            since: Instant::now(),
            send: send_tx,
            reader,
            writer,
        }
    }

    /// Queue a message for the peer. Gossip semantics: a full queue drops
    /// the message and reports `false`.
    pub fn send(&self, msg: WireMsg) -> bool {
        match self.send.try_send(msg) {
            Ok(()) => true,
            Err(e) => {
                debug!(conn = self.id, error = %e, "dropping outbound message");
                false
            }
        }
    }

    /// Stop both tasks; dropping the stream halves closes the socket.
    pub fn close(self) {
        self.reader.abort();
        self.writer.abort();
    }
}

async fn read_loop(id: ConnId, mut reader: OwnedReadHalf, events: mpsc::Sender<PeerEvent>) {
    loop {
        match read_frame(&mut reader).await {
            Ok(msg) => {
                if events.send(PeerEvent::Msg { conn: id, msg }).await.is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!(conn = id, error = %e, "peer read failed");
                let _ = events.send(PeerEvent::RemoveMe { conn: id }).await;
                return;
            }
        }
    }
}

async fn write_loop(
    id: ConnId,
    mut writer: OwnedWriteHalf,
    mut send_rx: mpsc::Receiver<WireMsg>,
    events: mpsc::Sender<PeerEvent>,
) {
    while let Some(msg) = send_rx.recv().await {
        if let Err(e) = write_frame(&mut writer, &msg).await {
            warn!(conn = id, error = %e, "peer write failed");
            let _ = events.send(PeerEvent::RemoveMe { conn: id }).await;
            return;
        }
    }
}
