//! Hashing and signature primitives for the ingot protocol.
//!
//! Everything chain-visible is double SHA3-256; signatures are recoverable
//! secp256k1 over a 32-byte digest, and addresses are the SHA3-256 of the
//! uncompressed public key.

pub mod error;
pub mod hash;
pub mod keys;
pub mod sign;

pub use error::CryptoError;
pub use hash::{double_sha3_256, sha3_256, sha3_256_multi};
pub use keys::{PrivateKey, PublicKey};
pub use sign::{recover_address, sign_digest};
