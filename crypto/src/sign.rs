//! Recoverable signing and address recovery.

use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, VerifyingKey};

use ingot_types::{Hash, Signature};

use crate::keys::{PrivateKey, PublicKey};
use crate::CryptoError;

/// Sign a 32-byte digest, producing the 65-byte `r ‖ s ‖ v` form.
pub fn sign_digest(digest: &Hash, key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (sig, recovery_id) = key
        .inner
        .sign_prehash_recoverable(digest.as_bytes())
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;

    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&sig.to_bytes());
    out[64] = recovery_id.to_byte();
    Ok(Signature::new(out))
}

/// Recover the signer's wallet address from a digest and its signature.
pub fn recover_address(digest: &Hash, signature: &Signature) -> Result<Hash, CryptoError> {
    let bytes = signature.as_bytes();
    let sig = EcdsaSignature::from_slice(&bytes[..64])
        .map_err(|e| CryptoError::InvalidSignature(e.to_string()))?;
    let recovery_id = RecoveryId::from_byte(bytes[64])
        .ok_or_else(|| CryptoError::RecoveryFailed("invalid recovery id".into()))?;

    let verifying_key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &sig, recovery_id)
        .map_err(|e| CryptoError::RecoveryFailed(e.to_string()))?;

    Ok(PublicKey {
        inner: verifying_key,
    }
    .address())
}
