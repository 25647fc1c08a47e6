//! The intra-node message fabric.
//!
//! One task, no state beyond channel handles. Every message arriving on
//! the inbound queue is forwarded to its destinations by type; delivery
//! is blocking except for peering's copy of a candidate, which may be
//! dropped under pressure.

use tokio::sync::mpsc;
use tracing::debug;

use ingot_messages::NodeMsg;

/// Capacity of the router's inbound queue.
pub const SERV_QUEUE_CAPACITY: usize = 64;
/// Capacity of each subsystem's admin queue.
pub const ADMIN_QUEUE_CAPACITY: usize = 1;

/// The routing task's channel handles.
pub struct Router {
    serv_rx: mpsc::Receiver<NodeMsg>,
    ledger_tx: mpsc::Sender<NodeMsg>,
    miner_tx: mpsc::Sender<NodeMsg>,
    peering_tx: mpsc::Sender<NodeMsg>,
    info_tx: mpsc::Sender<NodeMsg>,
}

/// The subsystem-side endpoints of the fabric.
pub struct RouterChannels {
    /// Inbound handle: everything any subsystem emits goes here.
    pub serv_tx: mpsc::Sender<NodeMsg>,
    pub ledger_rx: mpsc::Receiver<NodeMsg>,
    pub miner_rx: mpsc::Receiver<NodeMsg>,
    pub peering_rx: mpsc::Receiver<NodeMsg>,
    /// Height replies for whoever asked.
    pub info_rx: mpsc::Receiver<NodeMsg>,
}

/// Build the fabric at its configured capacities.
pub fn channels() -> (Router, RouterChannels) {
    let (serv_tx, serv_rx) = mpsc::channel(SERV_QUEUE_CAPACITY);
    let (ledger_tx, ledger_rx) = mpsc::channel(ADMIN_QUEUE_CAPACITY);
    let (miner_tx, miner_rx) = mpsc::channel(ADMIN_QUEUE_CAPACITY);
    let (peering_tx, peering_rx) = mpsc::channel(ADMIN_QUEUE_CAPACITY);
    let (info_tx, info_rx) = mpsc::channel(ADMIN_QUEUE_CAPACITY);
    (
        Router {
            serv_rx,
            ledger_tx,
            miner_tx,
            peering_tx,
            info_tx,
        },
        RouterChannels {
            serv_tx,
            ledger_rx,
            miner_rx,
            peering_rx,
            info_rx,
        },
    )
}

impl Router {
    /// Forward messages until the inbound queue closes or a destination
    /// disappears.
    pub async fn route(mut self) {
        while let Some(msg) = self.serv_rx.recv().await {
            match msg {
                NodeMsg::AddBlock { .. }
                | NodeMsg::Transaction(_)
                | NodeMsg::GenCandidate
                | NodeMsg::ReqHeight
                | NodeMsg::RemoveBlocks(_)
                | NodeMsg::RangeReq(_) => {
                    if self.ledger_tx.send(msg).await.is_err() {
                        return;
                    }
                }
                NodeMsg::CandidateBlock(block) => {
                    // peering's copy is best-effort; the miner's is not
                    if let Err(e) = self
                        .peering_tx
                        .try_send(NodeMsg::CandidateBlock(block.clone()))
                    {
                        debug!(error = %e, "peering missed a candidate");
                    }
                    if self
                        .miner_tx
                        .send(NodeMsg::CandidateBlock(block))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                NodeMsg::RemoteCandidate(block) => {
                    if self
                        .miner_tx
                        .send(NodeMsg::CandidateBlock(block))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                NodeMsg::StopMine => {
                    if self.miner_tx.send(NodeMsg::StopMine).await.is_err() {
                        return;
                    }
                }
                NodeMsg::ShareBlock(block) => {
                    if self
                        .peering_tx
                        .send(NodeMsg::ShareBlock(block))
                        .await
                        .is_err()
                    {
                        return;
                    }
                    if self.miner_tx.send(NodeMsg::StopMine).await.is_err() {
                        return;
                    }
                }
                NodeMsg::Range(blocks) => {
                    if self.peering_tx.send(NodeMsg::Range(blocks)).await.is_err() {
                        return;
                    }
                }
                NodeMsg::Height(height) => {
                    let _ = self.info_tx.send(NodeMsg::Height(height)).await;
                }
            }
        }
    }
}
