//! Typed events routed between the node's subsystems.
//!
//! Every long-lived task communicates exclusively through these values on
//! bounded queues; the router owns the fan-out table.

use ingot_ledger::{Block, Transaction};
use ingot_types::Hash;

/// An administrative message between the router, ledger, miner and
/// peering tasks.
#[derive(Clone, Debug)]
pub enum NodeMsg {
    /// A mined or remotely received block for the ledger to validate.
    AddBlock {
        block: Block,
        /// Address credited by the block's reward; mined blocks carry the
        /// local wallet, remote blocks whatever their coinbase names.
        miner: Hash,
    },
    /// A block to be mined, produced by the ledger.
    CandidateBlock(Block),
    /// A candidate received from the network; the router re-types it to
    /// `CandidateBlock` for the miner.
    RemoteCandidate(Block),
    /// Abandon the current nonce search.
    StopMine,
    /// A locally accepted block for peering to gossip.
    ShareBlock(Block),
    /// A user-submitted transaction for the pool.
    Transaction(Transaction),
    /// Ask the ledger to produce a candidate from the current pool.
    GenCandidate,
    /// Ask the ledger for its height; answered with [`NodeMsg::Height`].
    ReqHeight,
    /// The ledger's current top height, delivered to the info channel.
    Height(u64),
    /// Drop ledger blocks from this height to the top.
    RemoveBlocks(u64),
    /// Ask the ledger for blocks from this height to the top.
    RangeReq(u64),
    /// The ledger's reply to [`NodeMsg::RangeReq`], for peering to serve.
    Range(Vec<Block>),
}
