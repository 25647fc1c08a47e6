//! The authoritative chain state: blocks, transactions, validation rules,
//! and the pending-transaction pool.
//!
//! All state lives in memory and is owned by a single task; a restart
//! rebuilds the chain from peer gossip.

pub mod block;
pub mod chain;
pub mod error;
pub mod genesis;
pub mod merkle;
pub mod transaction;

pub use block::Block;
pub use chain::Chain;
pub use error::LedgerError;
pub use genesis::genesis_block;
pub use merkle::merkle_root;
pub use transaction::Transaction;
