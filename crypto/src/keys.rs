//! secp256k1 key pairs and address derivation.

use k256::ecdsa::{SigningKey, VerifyingKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;
use rand::rngs::OsRng;

use ingot_types::Hash;

use crate::hash::sha3_256;
use crate::CryptoError;

/// A secp256k1 secret key used for transaction signing.
#[derive(Clone)]
pub struct PrivateKey {
    pub(crate) inner: SigningKey,
}

impl PrivateKey {
    /// Generate a random key using the OS entropy source.
    pub fn random() -> Self {
        let secret = SecretKey::random(&mut OsRng);
        Self {
            inner: SigningKey::from(secret),
        }
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        let secret =
            SecretKey::from_bytes(bytes.into()).map_err(|_| CryptoError::InvalidPrivateKey)?;
        Ok(Self {
            inner: SigningKey::from(secret),
        })
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes().into()
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            inner: *self.inner.verifying_key(),
        }
    }
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("address", &self.public_key().address())
            .finish()
    }
}

/// A secp256k1 public key.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct PublicKey {
    pub(crate) inner: VerifyingKey,
}

impl PublicKey {
    /// The uncompressed SEC1 encoding, 65 bytes including the `0x04` tag.
    pub fn to_uncompressed(&self) -> [u8; 65] {
        let point = self.inner.to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// The wallet address: SHA3-256 of the uncompressed public key.
    pub fn address(&self) -> Hash {
        Hash::new(sha3_256(&self.to_uncompressed()))
    }
}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("address", &self.address())
            .finish()
    }
}
