//! Blocks and the proof-of-work rule.

use serde::{Deserialize, Serialize};
use std::fmt;

use ingot_crypto::double_sha3_256;
use ingot_types::Hash;

use crate::Transaction;

/// One block of the chain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Height of this block; genesis is 0.
    pub height: u64,
    /// Value the miner searches over.
    pub nonce: u64,
    /// Hash of the previous block.
    pub prev_hash: Hash,
    /// Merkle root over `transactions`.
    pub merkle_root: Hash,
    /// PoW threshold this block was mined against.
    pub target: Hash,
    /// Reward first, then transfers in sequence order.
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// A block awaiting mining: the miner supplies the reward, merkle root
    /// and nonce.
    pub fn candidate(
        height: u64,
        prev_hash: Hash,
        target: Hash,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            height,
            nonce: 0,
            prev_hash,
            merkle_root: Hash::ZERO,
            target,
            transactions,
        }
    }

    /// Double SHA3-256 over `prev_hash ‖ merkle_root ‖ target ‖ nonce_le8`.
    pub fn hash(&self) -> Hash {
        double_sha3_256(&[
            self.prev_hash.as_bytes(),
            self.merkle_root.as_bytes(),
            self.target.as_bytes(),
            &self.nonce.to_le_bytes(),
        ])
    }

    /// The byte-wise PoW rule: the hash fails iff any of its bytes exceeds
    /// the corresponding target byte.
    pub fn meets_target(&self) -> bool {
        self.hash()
            .as_bytes()
            .iter()
            .zip(self.target.as_bytes())
            .all(|(hash_byte, target_byte)| hash_byte <= target_byte)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "block {} (nonce {}, {} transactions)",
            self.height,
            self.nonce,
            self.transactions.len()
        )
    }
}
