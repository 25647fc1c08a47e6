//! Overlay membership, block gossip, and chain reconciliation.
//!
//! Each peer connection is a framed TCP stream served by a reader and a
//! writer task; the [`PeerServer`] task owns all membership state and is
//! the only consumer of connection events.

pub mod connection;
pub mod entry;
pub mod error;
pub mod server;
pub mod wire;

pub use connection::{ConnId, Connection, PeerEvent};
pub use error::PeeringError;
pub use server::{PeerServer, GOAL_PEERS, GOSSIP_FANOUT};
pub use wire::{HelloData, WireMsg};
