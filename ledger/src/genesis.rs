//! Genesis block construction.

use ingot_types::{Hash, ProtocolParams};

use crate::{merkle_root, Block, Transaction};

/// Build the chain's first block around the network's root transaction.
///
/// Genesis has a zero previous hash and is never validated against the
/// PoW or reward rules.
pub fn genesis_block(first: Transaction, params: &ProtocolParams) -> Block {
    let transactions = vec![first];
    let root =
        merkle_root(&transactions).expect("genesis carries the root transaction");
    Block {
        height: 0,
        nonce: 0,
        prev_hash: Hash::ZERO,
        merkle_root: root,
        target: params.target(),
        transactions,
    }
}
