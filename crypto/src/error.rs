use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid private key")]
    InvalidPrivateKey,

    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    #[error("public key recovery failed: {0}")]
    RecoveryFailed(String),
}
