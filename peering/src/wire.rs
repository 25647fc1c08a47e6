//! The peer-to-peer wire envelope and its framing.
//!
//! Every message is a bincode-encoded [`WireMsg`] behind a 4-byte
//! big-endian length prefix.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use ingot_ledger::Block;
use ingot_types::Hash;

use crate::PeeringError;

/// Upper bound on one framed message.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024; // 16 MiB

/// Handshake payload: the sender's reachable address and its chain's
/// merkle roots for heights `1..=top`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelloData {
    pub addr: String,
    pub roots: Vec<Hash>,
}

impl HelloData {
    /// Height of the chain the hello describes.
    pub fn height(&self) -> u64 {
        self.roots.len() as u64
    }
}

/// A message exchanged between peers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum WireMsg {
    /// A candidate block for peers that mine.
    Candidate(Block),
    /// A mined block offered to the remote ledger.
    Block(Block),
    /// Dial-side handshake.
    Hello(HelloData),
    /// Handshake response, same shape as [`WireMsg::Hello`].
    HelloRes(HelloData),
    /// Ask for every block from this height to the remote top.
    RangeReq(u64),
    /// Known peer addresses.
    Peers(Vec<String>),
}

/// Write one framed message.
pub async fn write_frame<W>(writer: &mut W, msg: &WireMsg) -> Result<(), PeeringError>
where
    W: AsyncWrite + Unpin,
{
    let payload = bincode::serialize(msg)?;
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(PeeringError::Oversize(payload.len()));
    }
    writer.write_all(&(payload.len() as u32).to_be_bytes()).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one framed message.
pub async fn read_frame<R>(reader: &mut R) -> Result<WireMsg, PeeringError>
where
    R: AsyncRead + Unpin,
{
    let mut len_buf = [0u8; 4];
    reader.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_SIZE {
        return Err(PeeringError::Oversize(len));
    }
    let mut body = vec![0u8; len];
    reader.read_exact(&mut body).await?;
    Ok(bincode::deserialize(&body)?)
}
