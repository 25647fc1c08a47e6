use thiserror::Error;

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("crypto error: {0}")]
    Crypto(#[from] ingot_crypto::CryptoError),
}
