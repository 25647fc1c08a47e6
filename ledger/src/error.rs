use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("block height {have} does not extend the chain at {want}")]
    HeightMismatch { have: u64, want: u64 },

    #[error("block hash does not meet the target")]
    WorkInvalid,

    #[error("previous block hash mismatch")]
    PrevHashMismatch,

    #[error("target hash mismatch")]
    TargetMismatch,

    #[error("merkle root mismatch")]
    MerkleMismatch,

    #[error("cannot build a merkle tree without transactions")]
    EmptyMerkle,

    #[error("block carries no transactions besides the reward")]
    EmptyBlock,

    #[error("reward transaction incorrect")]
    RewardInvalid,

    #[error("transaction sequence out of order at {seq}")]
    SequenceGap { seq: u32 },

    #[error("balance is {balance}, tried to send {amount}")]
    InsufficientBalance { balance: i64, amount: u32 },

    #[error("signature invalid")]
    SignatureInvalid,

    #[error("sender and receiver are the same")]
    SelfTransfer,

    #[error("transaction has bad block height {height}")]
    StaleHeight { height: u64 },
}
