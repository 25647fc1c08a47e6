//! Signature type shared between the wallet, ledger and wire layers.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A 65-byte recoverable secp256k1 signature: `r ‖ s ‖ v`.
///
/// The all-zero signature marks coinbase rewards, which are never verified.
/// Serde impls are written by hand, since the array is larger than what
/// the derive supports; they encode a length-prefixed byte sequence.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 65]);

impl Signature {
    /// Signature size in bytes.
    pub const SIZE: usize = 65;

    /// The placeholder signature carried by coinbase rewards.
    pub const ZERO: Self = Self([0u8; 65]);

    pub fn new(bytes: [u8; 65]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 65] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 65]
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let bytes = Vec::<u8>::deserialize(deserializer)?;
        if bytes.len() != Self::SIZE {
            return Err(serde::de::Error::invalid_length(
                bytes.len(),
                &"a 65-byte signature",
            ));
        }
        let mut out = [0u8; 65];
        out.copy_from_slice(&bytes);
        Ok(Self(out))
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature(")?;
        for b in &self.0[..4] {
            write!(f, "{:02x}", b)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Signature {
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
    fn zero_signature() {
        assert!(Signature::ZERO.is_zero());
        let mut bytes = [0u8; 65];
        bytes[64] = 1;
        assert!(!Signature::new(bytes).is_zero());
    }

    #[test]
    fn display_covers_all_bytes() {
        assert_eq!(Signature::ZERO.to_string().len(), 130);
    }
}
