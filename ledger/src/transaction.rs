//! Transactions and their signing rules.

use serde::{Deserialize, Serialize};
use std::fmt;

use ingot_crypto::{double_sha3_256, recover_address, sign_digest, CryptoError, PrivateKey};
use ingot_types::{Hash, Signature};

use crate::LedgerError;

/// A transfer recorded on the chain.
///
/// The signature covers the digest of `"sender,receiver,amount,height"`
/// rendered as text, so `seq` can be renumbered while a transaction waits
/// in the pool without invalidating it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Position within the containing block; 0 is reserved for the reward.
    pub seq: u32,
    /// Sender's wallet address (all-zero for the reward).
    pub sender: Hash,
    /// Receiver's wallet address.
    pub receiver: Hash,
    /// Amount of coins transferred.
    pub amount: u32,
    /// Recoverable signature by the sender (all-zero for the reward).
    pub signature: Signature,
    /// Height of the block this transaction is valid in.
    pub height: u64,
}

impl Transaction {
    /// Build an unsigned transfer with no sequence number yet.
    pub fn new(sender: Hash, receiver: Hash, amount: u32, height: u64) -> Self {
        Self {
            seq: 0,
            sender,
            receiver,
            amount,
            signature: Signature::ZERO,
            height,
        }
    }

    /// The reward paying `miner` for the block at `height`.
    pub fn coinbase(miner: Hash, reward: u32, height: u64) -> Self {
        Self {
            seq: 0,
            sender: Hash::ZERO,
            receiver: miner,
            amount: reward,
            signature: Signature::ZERO,
            height,
        }
    }

    pub fn is_coinbase(&self) -> bool {
        self.seq == 0
    }

    /// Text under the signature: excludes `seq` and `signature`.
    fn predigest(&self) -> String {
        format!(
            "{},{},{},{}",
            self.sender, self.receiver, self.amount, self.height
        )
    }

    /// The digest the sender signs.
    pub fn digest(&self) -> Hash {
        double_sha3_256(&[self.predigest().as_bytes()])
    }

    /// The transaction id: double hash over every field.
    pub fn hash(&self) -> Hash {
        double_sha3_256(&[self.to_string().as_bytes()])
    }

    /// Sign the digest with the sender's key.
    pub fn sign(&mut self, key: &PrivateKey) -> Result<(), CryptoError> {
        self.signature = sign_digest(&self.digest(), key)?;
        Ok(())
    }

    /// Recover the signer and require it to be the sender.
    pub fn verify_signature(&self) -> Result<(), LedgerError> {
        let recovered = recover_address(&self.digest(), &self.signature)
            .map_err(|_| LedgerError::SignatureInvalid)?;
        if recovered != self.sender {
            return Err(LedgerError::SignatureInvalid);
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{},{},{}",
            self.seq, self.sender, self.receiver, self.amount, self.signature, self.height
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed_wallet() -> (PrivateKey, Hash) {
        let key = PrivateKey::random();
        let addr = key.public_key().address();
        (key, addr)
    }

    #[test]
    fn digest_ignores_seq_and_signature() {
        let (key, sender) = keyed_wallet();
        let receiver = Hash::new([9u8; 32]);
        let mut t = Transaction::new(sender, receiver, 5, 3);
        let before = t.digest();
        t.seq = 7;
        t.sign(&key).unwrap();
        assert_eq!(t.digest(), before);
    }

    #[test]
    fn hash_covers_seq() {
        let (_, sender) = keyed_wallet();
        let mut t = Transaction::new(sender, Hash::new([9u8; 32]), 5, 3);
        let before = t.hash();
        t.seq = 1;
        assert_ne!(t.hash(), before);
    }

    #[test]
    fn signed_transaction_verifies() {
        let (key, sender) = keyed_wallet();
        let mut t = Transaction::new(sender, Hash::new([9u8; 32]), 5, 1);
        t.sign(&key).unwrap();
        t.verify_signature().unwrap();
    }

    #[test]
    fn signature_by_other_key_rejected() {
        let (_, sender) = keyed_wallet();
        let (other_key, _) = keyed_wallet();
        let mut t = Transaction::new(sender, Hash::new([9u8; 32]), 5, 1);
        t.sign(&other_key).unwrap();
        assert!(matches!(
            t.verify_signature(),
            Err(LedgerError::SignatureInvalid)
        ));
    }

    #[test]
    fn unsigned_transaction_rejected() {
        let (_, sender) = keyed_wallet();
        let t = Transaction::new(sender, Hash::new([9u8; 32]), 5, 1);
        assert!(t.verify_signature().is_err());
    }

    #[test]
    fn coinbase_shape() {
        let miner = Hash::new([3u8; 32]);
        let reward = Transaction::coinbase(miner, 10, 4);
        assert!(reward.is_coinbase());
        assert_eq!(reward.sender, Hash::ZERO);
        assert_eq!(reward.receiver, miner);
        assert_eq!(reward.amount, 10);
        assert_eq!(reward.height, 4);
        assert!(reward.signature.is_zero());
    }
}
