//! The 32-byte digest used for block hashes, transaction ids, addresses
//! and PoW targets.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A 32-byte double-SHA3-256 digest. Equality is byte-wise; the fixed size
/// makes length-mismatched comparisons unrepresentable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hash([u8; 32]);

impl Hash {
    /// Digest size in bytes.
    pub const SIZE: usize = 32;

    /// The all-zero hash: genesis prev-hash, reward sender, default values.
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hash(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in &self.0 {
            write!(f, "{:02x}", b)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hash_is_zero() {
        assert!(Hash::ZERO.is_zero());
        assert!(!Hash::new([1u8; 32]).is_zero());
    }

    #[test]
    fn display_is_lowercase_hex() {
        let mut bytes = [0u8; 32];
        bytes[0] = 0xAB;
        bytes[31] = 0x01;
        let hex = Hash::new(bytes).to_string();
        assert_eq!(hex.len(), 64);
        assert!(hex.starts_with("ab"));
        assert!(hex.ends_with("01"));
    }

    #[test]
    fn equality_is_bytewise() {
        assert_eq!(Hash::new([7u8; 32]), Hash::new([7u8; 32]));
        assert_ne!(Hash::new([7u8; 32]), Hash::new([8u8; 32]));
    }
}
