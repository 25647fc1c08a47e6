//! Balanced SHA3 merkle tree over a block's transactions.

use ingot_crypto::{sha3_256, sha3_256_multi};
use ingot_types::Hash;

use crate::{LedgerError, Transaction};

/// Compute the merkle root of an ordered transaction list.
///
/// Leaves are the transactions' double-SHA3 ids; interior nodes hash the
/// concatenated children; levels of odd width duplicate their last node.
/// The tree root is hashed once more, making the whole construction a
/// double hash over the leaves.
pub fn merkle_root(transactions: &[Transaction]) -> Result<Hash, LedgerError> {
    if transactions.is_empty() {
        return Err(LedgerError::EmptyMerkle);
    }

    let mut level: Vec<[u8; 32]> = transactions.iter().map(|t| *t.hash().as_bytes()).collect();
    while level.len() > 1 {
        if level.len() % 2 == 1 {
            level.push(level[level.len() - 1]);
        }
        level = level
            .chunks(2)
            .map(|pair| sha3_256_multi(&[&pair[0], &pair[1]]))
            .collect();
    }

    Ok(Hash::new(sha3_256(&level[0])))
}
