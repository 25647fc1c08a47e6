//! Nonce search over candidate blocks, cancellable between attempts.

use rand::Rng;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tracing::{debug, info, warn};

use ingot_ledger::{merkle_root, Block, Transaction};
use ingot_messages::NodeMsg;
use ingot_types::{Hash, ProtocolParams};

/// How one nonce search ended.
enum Outcome {
    Mined(Block),
    Cancelled,
    Restart(Block),
}

/// Mines candidate blocks for the wallet that owns this node.
///
/// Run on a dedicated OS thread: the search loop is tight and never
/// yields, so it must not share an async worker.
pub struct Miner {
    address: Hash,
    params: ProtocolParams,
}

impl Miner {
    pub fn new(address: Hash, params: ProtocolParams) -> Self {
        Self { address, params }
    }

    /// Consume candidates until the inbox closes.
    ///
    /// A `StopMine` while idle is a no-op; while searching it abandons the
    /// candidate. A newer candidate observed mid-search replaces the
    /// current one.
    pub fn run(self, mut rx: mpsc::Receiver<NodeMsg>, tx: mpsc::Sender<NodeMsg>) {
        while let Some(msg) = rx.blocking_recv() {
            let mut candidate = match msg {
                NodeMsg::CandidateBlock(block) => block,
                NodeMsg::StopMine => continue,
                other => {
                    debug!(?other, "miner ignoring message");
                    continue;
                }
            };
            loop {
                match self.search(candidate, &mut rx) {
                    Outcome::Mined(block) => {
                        info!(height = block.height, nonce = block.nonce, "mined block");
                        let msg = NodeMsg::AddBlock {
                            block,
                            miner: self.address,
                        };
                        if tx.blocking_send(msg).is_err() {
                            return;
                        }
                        break;
                    }
                    Outcome::Cancelled => break,
                    Outcome::Restart(next) => candidate = next,
                }
            }
        }
    }

    /// Prepend the reward, fix up the merkle root, and walk nonces from a
    /// random seed. The inbox is peeked without blocking on every attempt.
    fn search(&self, mut block: Block, rx: &mut mpsc::Receiver<NodeMsg>) -> Outcome {
        block.transactions.insert(
            0,
            Transaction::coinbase(self.address, self.params.reward, block.height),
        );
        block.merkle_root = match merkle_root(&block.transactions) {
            Ok(root) => root,
            Err(e) => {
                warn!(error = %e, "abandoning unusable candidate");
                return Outcome::Cancelled;
            }
        };
        block.nonce = rand::thread_rng().gen();

        loop {
            if block.meets_target() {
                return Outcome::Mined(block);
            }
            match rx.try_recv() {
                Ok(NodeMsg::StopMine) => {
                    debug!(height = block.height, "mining cancelled");
                    return Outcome::Cancelled;
                }
                Ok(NodeMsg::CandidateBlock(next)) => {
                    debug!(height = next.height, "restarting on newer candidate");
                    return Outcome::Restart(next);
                }
                Ok(other) => debug!(?other, "miner ignoring message"),
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => return Outcome::Cancelled,
            }
            block.nonce = block.nonce.wrapping_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    fn permissive() -> ProtocolParams {
        ProtocolParams::new(32, 10).unwrap()
    }

    fn impossible() -> ProtocolParams {
        // an all-zero target rejects every hash
        ProtocolParams::new(0, 10).unwrap()
    }

    fn candidate(params: &ProtocolParams) -> Block {
        let mut t = Transaction::new(Hash::new([1u8; 32]), Hash::new([2u8; 32]), 1, 1);
        t.seq = 1;
        Block::candidate(1, Hash::ZERO, params.target(), vec![t])
    }

    #[test]
    fn mines_and_emits_add_block() {
        let params = permissive();
        let miner_addr = Hash::new([7u8; 32]);
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, mut out_rx) = mpsc::channel(8);

        let miner = Miner::new(miner_addr, params);
        let handle = thread::spawn(move || miner.run(in_rx, out_tx));

        in_tx
            .blocking_send(NodeMsg::CandidateBlock(candidate(&params)))
            .unwrap();

        match out_rx.blocking_recv().unwrap() {
            NodeMsg::AddBlock { block, miner } => {
                assert_eq!(miner, miner_addr);
                assert_eq!(block.height, 1);
                assert!(block.meets_target());
                assert!(block.transactions[0].is_coinbase());
                assert_eq!(block.transactions[0].receiver, miner_addr);
                assert_eq!(
                    block.merkle_root,
                    merkle_root(&block.transactions).unwrap()
                );
            }
            other => panic!("expected AddBlock, got {:?}", other),
        }

        drop(in_tx);
        handle.join().unwrap();
    }

    #[test]
    fn stop_mine_cancels_the_search() {
        let params = impossible();
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, mut out_rx) = mpsc::channel(8);

        let miner = Miner::new(Hash::new([7u8; 32]), params);
        let handle = thread::spawn(move || miner.run(in_rx, out_tx));

        in_tx
            .blocking_send(NodeMsg::CandidateBlock(candidate(&params)))
            .unwrap();
        in_tx.blocking_send(NodeMsg::StopMine).unwrap();

        // give the search loop time to observe the stop, then close
        thread::sleep(Duration::from_millis(100));
        drop(in_tx);
        handle.join().unwrap();

        assert!(out_rx.try_recv().is_err(), "cancelled work must not emit");
    }

    #[test]
    fn idle_stop_mine_is_a_no_op() {
        let params = permissive();
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, mut out_rx) = mpsc::channel(8);

        let miner = Miner::new(Hash::new([7u8; 32]), params);
        let handle = thread::spawn(move || miner.run(in_rx, out_tx));

        in_tx.blocking_send(NodeMsg::StopMine).unwrap();
        in_tx
            .blocking_send(NodeMsg::CandidateBlock(candidate(&params)))
            .unwrap();

        assert!(matches!(
            out_rx.blocking_recv().unwrap(),
            NodeMsg::AddBlock { .. }
        ));

        drop(in_tx);
        handle.join().unwrap();
    }

    #[test]
    fn newer_candidate_replaces_the_search() {
        let impossible_params = impossible();
        let permissive_params = permissive();
        let (in_tx, in_rx) = mpsc::channel(1);
        let (out_tx, mut out_rx) = mpsc::channel(8);

        let miner = Miner::new(Hash::new([7u8; 32]), impossible_params);
        let handle = thread::spawn(move || miner.run(in_rx, out_tx));

        // unminable first candidate keeps the loop spinning
        in_tx
            .blocking_send(NodeMsg::CandidateBlock(candidate(&impossible_params)))
            .unwrap();
        // the replacement carries a permissive target
        let mut next = candidate(&permissive_params);
        next.height = 2;
        next.transactions[0].height = 2;
        in_tx.blocking_send(NodeMsg::CandidateBlock(next)).unwrap();

        match out_rx.blocking_recv().unwrap() {
            NodeMsg::AddBlock { block, .. } => assert_eq!(block.height, 2),
            other => panic!("expected AddBlock, got {:?}", other),
        }

        drop(in_tx);
        handle.join().unwrap();
    }
}
