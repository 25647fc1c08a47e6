//! The chain, its pending-transaction pool, and every validation rule.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use ingot_types::{Hash, ProtocolParams};

use crate::{genesis_block, merkle_root, Block, LedgerError, Transaction};

/// Initial pool allocation.
const INITIAL_POOL: usize = 32;

/// The authoritative in-memory chain. Owned by a single task; every
/// mutation goes through that owner, which is the only synchronization
/// this state needs.
pub struct Chain {
    params: ProtocolParams,
    /// Number of non-genesis blocks; also the height of the newest block.
    top: u64,
    /// Blocks by height, contiguous over `[0, top]`.
    blocks: HashMap<u64, Block>,
    /// Transactions not yet in any block, `seq` numbered from 1.
    pool: Vec<Transaction>,
}

impl Chain {
    /// Start a chain at its genesis block around the root transaction.
    pub fn new(first: Transaction, params: ProtocolParams) -> Self {
        let mut blocks = HashMap::new();
        blocks.insert(0, genesis_block(first, &params));
        Self {
            params,
            top: 0,
            blocks,
            pool: Vec::with_capacity(INITIAL_POOL),
        }
    }

    pub fn top_height(&self) -> u64 {
        self.top
    }

    /// The newest block.
    pub fn top(&self) -> &Block {
        self.blocks.get(&self.top).expect("chain holds its top block")
    }

    /// Pending transactions awaiting the next block.
    pub fn pool(&self) -> &[Transaction] {
        &self.pool
    }

    /// Validate and append a transaction to the pool, assigning the next
    /// sequence number. The pool is left untouched on rejection.
    pub fn enqueue(&mut self, mut t: Transaction) -> Result<(), LedgerError> {
        t.seq = self.pool.len() as u32 + 1;
        self.validate_transaction(&t, &self.pool)?;
        debug!(seq = t.seq, amount = t.amount, "queued transaction");
        self.pool.push(t);
        Ok(())
    }

    /// A copy of the pool packaged as the next block. The reward, merkle
    /// root and nonce are the miner's to fill in.
    pub fn candidate(&self) -> Block {
        Block::candidate(
            self.top + 1,
            self.top().hash(),
            self.params.target(),
            self.pool.clone(),
        )
    }

    /// Validate a block against the current tip and install it, then purge
    /// the pool of everything the block carried.
    pub fn add_block(&mut self, b: Block) -> Result<(), LedgerError> {
        if b.height != self.top + 1 {
            return Err(LedgerError::HeightMismatch {
                have: b.height,
                want: self.top + 1,
            });
        }
        if !b.meets_target() {
            return Err(LedgerError::WorkInvalid);
        }
        if b.prev_hash != self.top().hash() {
            return Err(LedgerError::PrevHashMismatch);
        }
        if b.target != self.params.target() {
            return Err(LedgerError::TargetMismatch);
        }
        if merkle_root(&b.transactions)? != b.merkle_root {
            return Err(LedgerError::MerkleMismatch);
        }
        if b.transactions.len() < 2 {
            return Err(LedgerError::EmptyBlock);
        }
        self.validate_reward(&b)?;
        for (position, t) in b.transactions.iter().enumerate() {
            if t.seq != position as u32 {
                return Err(LedgerError::SequenceGap { seq: t.seq });
            }
            if t.is_coinbase() {
                continue;
            }
            self.validate_transaction(t, &b.transactions)?;
        }

        let included = b.transactions.clone();
        self.top += 1;
        self.blocks.insert(self.top, b);
        info!(height = self.top, "added block");
        self.purge_pool(&included);
        Ok(())
    }

    /// Drop blocks `[first, top]`; a longer remote chain supersedes them.
    /// Genesis is never removed.
    pub fn remove_blocks(&mut self, first: u64) {
        if first == 0 {
            warn!("refusing to remove the genesis block");
            return;
        }
        let mut h = first;
        while h <= self.top {
            debug!(height = h, "removed block");
            self.blocks.remove(&h);
            h += 1;
        }
        if first <= self.top + 1 {
            self.top = first - 1;
        }
    }

    /// Blocks `[first, top]` in ascending order.
    pub fn range(&self, first: u64) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut h = first;
        while h <= self.top {
            if let Some(b) = self.blocks.get(&h) {
                blocks.push(b.clone());
            }
            h += 1;
        }
        blocks
    }

    /// Net balance of an account over every accepted block.
    pub fn balance(&self, account: &Hash) -> i64 {
        let mut balance = 0i64;
        for h in 0..=self.top {
            let Some(block) = self.blocks.get(&h) else {
                continue;
            };
            for t in &block.transactions {
                if &t.sender == account {
                    balance -= t.amount as i64;
                } else if &t.receiver == account {
                    balance += t.amount as i64;
                }
            }
        }
        balance
    }

    /// The full transaction rule set: funds, signature, distinct parties,
    /// and a height that targets the next block.
    fn validate_transaction(
        &self,
        t: &Transaction,
        external: &[Transaction],
    ) -> Result<(), LedgerError> {
        self.validate_balance(&t.sender, t.amount, t.seq, external)?;
        t.verify_signature()?;
        if t.sender == t.receiver {
            return Err(LedgerError::SelfTransfer);
        }
        if t.height != self.top + 1 {
            return Err(LedgerError::StaleHeight { height: t.height });
        }
        Ok(())
    }

    /// Sender must cover `amount` over the whole chain plus every other
    /// pending transaction (`seq` identifies the one under validation).
    fn validate_balance(
        &self,
        sender: &Hash,
        amount: u32,
        seq: u32,
        external: &[Transaction],
    ) -> Result<(), LedgerError> {
        let mut balance = self.balance(sender);
        for t in external {
            if t.seq == seq {
                continue;
            }
            if &t.sender == sender {
                balance -= t.amount as i64;
            } else if &t.receiver == sender {
                balance += t.amount as i64;
            }
        }
        if balance < amount as i64 {
            return Err(LedgerError::InsufficientBalance { balance, amount });
        }
        Ok(())
    }

    /// The reward must sit at position 0 and pay exactly the configured
    /// amount from the zero address, unsigned.
    fn validate_reward(&self, b: &Block) -> Result<(), LedgerError> {
        let reward = &b.transactions[0];
        let well_formed = reward.seq == 0
            && reward.sender == Hash::ZERO
            && reward.signature.is_zero()
            && reward.amount == self.params.reward
            && reward.height == b.height;
        if !well_formed {
            return Err(LedgerError::RewardInvalid);
        }
        Ok(())
    }

    /// Drop every pooled transaction the new block carried, then re-admit
    /// the survivors one by one against the new tip, renumbering from 1.
    fn purge_pool(&mut self, included: &[Transaction]) {
        let old = std::mem::take(&mut self.pool);
        self.pool = Vec::with_capacity(old.len());
        for mut t in old {
            if included.contains(&t) {
                continue;
            }
            t.seq = self.pool.len() as u32 + 1;
            match self.validate_transaction(&t, &self.pool) {
                Ok(()) => self.pool.push(t),
                Err(e) => debug!(error = %e, "dropping stale pooled transaction"),
            }
        }
        info!(kept = self.pool.len(), "pruned pool after block");
    }
}
