//! The single task that owns the chain.
//!
//! Validation failures are reported and dropped; the task never dies on
//! a bad submission.

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ingot_ledger::Chain;
use ingot_messages::NodeMsg;

/// Consume ledger-bound messages until the inbox closes.
///
/// On every accepted block the new tip is shared with the network and,
/// while transactions remain pooled, a fresh candidate is issued.
pub async fn run_ledger(mut chain: Chain, mut rx: mpsc::Receiver<NodeMsg>, tx: mpsc::Sender<NodeMsg>) {
    while let Some(msg) = rx.recv().await {
        match msg {
            NodeMsg::AddBlock { block, miner } => {
                let height = block.height;
                debug!(height, "inspecting block");
                match chain.add_block(block) {
                    Ok(()) => {
                        info!(height, miner = %miner, "sharing block");
                        let top = chain.top().clone();
                        if tx.send(NodeMsg::ShareBlock(top)).await.is_err() {
                            return;
                        }
                        if !chain.pool().is_empty()
                            && tx
                                .send(NodeMsg::CandidateBlock(chain.candidate()))
                                .await
                                .is_err()
                        {
                            return;
                        }
                    }
                    Err(e) => warn!(height, error = %e, "skipping block"),
                }
            }
            NodeMsg::Transaction(t) => {
                if let Err(e) = chain.enqueue(t) {
                    warn!(error = %e, "queue rejects bad transaction");
                }
            }
            NodeMsg::GenCandidate => {
                debug!("sending candidate");
                if tx
                    .send(NodeMsg::CandidateBlock(chain.candidate()))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            NodeMsg::ReqHeight => {
                if tx.send(NodeMsg::Height(chain.top_height())).await.is_err() {
                    return;
                }
            }
            NodeMsg::RemoveBlocks(first) => chain.remove_blocks(first),
            NodeMsg::RangeReq(first) => {
                if tx.send(NodeMsg::Range(chain.range(first))).await.is_err() {
                    return;
                }
            }
            other => debug!(?other, "ledger ignoring message"),
        }
    }
}
