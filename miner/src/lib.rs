//! The cooperative proof-of-work worker.

pub mod miner;

pub use miner::Miner;
