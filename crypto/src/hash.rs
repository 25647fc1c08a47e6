//! SHA3-256 hashing for blocks, transactions and addresses.

use ingot_types::Hash;
use sha3::{Digest, Sha3_256};

/// Compute a SHA3-256 hash of arbitrary data.
pub fn sha3_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn sha3_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha3_256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// The protocol's double hash: SHA3-256 over the SHA3-256 of the
/// concatenated parts.
pub fn double_sha3_256(parts: &[&[u8]]) -> Hash {
    Hash::new(sha3_256(&sha3_256_multi(parts)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha3_deterministic() {
        assert_eq!(sha3_256(b"hello ingot"), sha3_256(b"hello ingot"));
    }

    #[test]
    fn sha3_different_inputs() {
        assert_ne!(sha3_256(b"hello"), sha3_256(b"world"));
    }

    #[test]
    fn multi_equivalent_to_concatenation() {
        assert_eq!(sha3_256(b"helloworld"), sha3_256_multi(&[b"hello", b"world"]));
    }

    #[test]
    fn double_hash_is_not_single_hash() {
        let single = sha3_256(b"data");
        let double = double_sha3_256(&[b"data"]);
        assert_ne!(&single, double.as_bytes());
        assert_eq!(double.as_bytes(), &sha3_256(&single));
    }
}
