//! Node wiring: load state, build the fabric, spawn every task.

use std::thread;

use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use ingot_ledger::Chain;
use ingot_messages::NodeMsg;
use ingot_miner::Miner;
use ingot_peering::{entry, PeerServer};
use ingot_types::Hash;

use crate::config::{NodeConfig, PeerMode};
use crate::error::NodeError;
use crate::ledger_service::run_ledger;
use crate::router;

/// A running node.
///
/// Owns the spawned task handles; `shutdown` stops everything. The info
/// receiver returned by [`IngotNode::start`] carries `Height` replies and
/// belongs to whoever drives the node (the daemon's shell, or a test).
pub struct IngotNode {
    /// Handle for submitting events into the router.
    pub serv_tx: mpsc::Sender<NodeMsg>,
    /// Address of the wallet this node mines for.
    pub wallet_address: Hash,
    tasks: Vec<JoinHandle<()>>,
    miner_thread: thread::JoinHandle<()>,
}

impl IngotNode {
    /// Load the root wallet and transaction, bind the peering listener,
    /// and spawn the router, ledger, peering and miner.
    pub async fn start(
        config: NodeConfig,
    ) -> Result<(Self, mpsc::Receiver<NodeMsg>), NodeError> {
        let wallet = ingot_wallet::load_wallet(&config.rootwall_path)?;
        let first = ingot_wallet::load_transaction(&config.roottrans_path)?;
        let chain = Chain::new(first, config.params);

        let (router, channels) = router::channels();
        let router::RouterChannels {
            serv_tx,
            ledger_rx,
            miner_rx,
            peering_rx,
            info_rx,
        } = channels;

        let listener = TcpListener::bind(config.local_addr()).await?;
        info!(addr = %config.local_addr(), "listening for peers");

        let dial_target = match &config.mode {
            PeerMode::NoPeer => None,
            PeerMode::Peer(target) => Some(target.clone()),
            PeerMode::Auto => Some(entry::random_entry_addr(&config.entryaddrs_path)?),
        };

        let (peer_server, events_rx) = PeerServer::new(config.local_addr(), serv_tx.clone());

        let mut tasks = Vec::new();
        tasks.push(tokio::spawn(router.route()));
        tasks.push(tokio::spawn(run_ledger(chain, ledger_rx, serv_tx.clone())));
        tasks.push(tokio::spawn(peer_server.run(
            listener,
            events_rx,
            peering_rx,
            dial_target,
        )));

        let miner = Miner::new(wallet.address(), config.params);
        let miner_out = serv_tx.clone();
        let miner_thread = thread::Builder::new()
            .name("ingot-miner".into())
            .spawn(move || miner.run(miner_rx, miner_out))?;

        info!(wallet = %wallet.address(), "node started");
        let node = Self {
            serv_tx,
            wallet_address: wallet.address(),
            tasks,
            miner_thread,
        };
        Ok((node, info_rx))
    }

    /// Stop every task and join the miner thread.
    pub async fn shutdown(self) {
        for task in &self.tasks {
            task.abort();
        }
        for task in self.tasks {
            let _ = task.await;
        }
        // aborting the router dropped the miner's inbox sender, so the
        // thread falls out of its receive loop
        drop(self.serv_tx);
        let _ = self.miner_thread.join();
        info!("node stopped");
    }
}
