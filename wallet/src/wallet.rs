//! Key pair and signing operations.

use ingot_crypto::{CryptoError, PrivateKey};
use ingot_ledger::Transaction;
use ingot_types::Hash;

/// A secp256k1 key pair and its derived wallet address.
pub struct Wallet {
    secret: PrivateKey,
    address: Hash,
}

impl Wallet {
    /// Generate a fresh wallet.
    pub fn generate() -> Self {
        Self::from_key(PrivateKey::random())
    }

    pub fn from_key(secret: PrivateKey) -> Self {
        let address = secret.public_key().address();
        Self { secret, address }
    }

    pub fn from_secret_bytes(bytes: &[u8; 32]) -> Result<Self, CryptoError> {
        Ok(Self::from_key(PrivateKey::from_bytes(bytes)?))
    }

    pub fn address(&self) -> Hash {
        self.address
    }

    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes()
    }

    /// Build and sign a transfer valid in the block at `height`.
    pub fn transfer(
        &self,
        receiver: Hash,
        amount: u32,
        height: u64,
    ) -> Result<Transaction, CryptoError> {
        let mut t = Transaction::new(self.address, receiver, amount, height);
        t.sign(&self.secret)?;
        Ok(t)
    }

    /// The network's first transaction: one coin from the zero address to
    /// this wallet at genesis height. Signed by convention; the reward
    /// position exempts it from signature checks.
    pub fn genesis_transaction(&self) -> Result<Transaction, CryptoError> {
        let mut t = Transaction::new(Hash::ZERO, self.address, 1, 0);
        t.sign(&self.secret)?;
        Ok(t)
    }
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet").field("address", &self.address).finish()
    }
}
