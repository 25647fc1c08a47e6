//! The peering manager: peer table, handshake, gossip, and catch-up.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::seq::SliceRandom;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use ingot_ledger::Block;
use ingot_messages::NodeMsg;
use ingot_types::Hash;

use crate::connection::{ConnId, Connection, PeerEvent};
use crate::wire::{HelloData, WireMsg};
use crate::PeeringError;

/// Peers a gossiped block is forwarded to.
pub const GOSSIP_FANOUT: usize = 2;
/// Target connection count when dialing discovered peers.
pub const GOAL_PEERS: usize = 8;
/// Capacity of the manager's internal event queue.
pub const EVENT_QUEUE_CAPACITY: usize = 32;

/// Owns every piece of overlay state: the connection set, the registered
/// peer table, the seen-address set, the chain-root cache mirrored from
/// accepted blocks, and the queue of peers awaiting a block range.
pub struct PeerServer {
    local_addr: String,
    next_conn: ConnId,
    conns: HashMap<ConnId, Connection>,
    /// Registered peers: advertised address → connection.
    peers: HashMap<String, ConnId>,
    /// Every address ever observed, dialed or not.
    seen: HashSet<String>,
    /// Registered addresses in registration order, for sampling and
    /// peer-list exchange.
    targets: Vec<String>,
    /// Merkle roots for heights `1..=top`, mirrored from shared blocks.
    roots: HashMap<u64, Hash>,
    top: u64,
    /// Peers awaiting a block range, in request order.
    pending_ranges: VecDeque<String>,
    events_tx: mpsc::Sender<PeerEvent>,
    serv_tx: mpsc::Sender<NodeMsg>,
}

impl PeerServer {
    /// Build a server and the event queue its connections feed.
    pub fn new(local_addr: String, serv_tx: mpsc::Sender<NodeMsg>) -> (Self, mpsc::Receiver<PeerEvent>) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let server = Self {
            local_addr,
            next_conn: 0,
            conns: HashMap::new(),
            peers: HashMap::new(),
            seen: HashSet::new(),
            targets: Vec::new(),
            roots: HashMap::new(),
            top: 0,
            pending_ranges: VecDeque::new(),
            events_tx,
            serv_tx,
        };
        (server, events_rx)
    }

    /// Accept inbound streams, consume connection events and admin
    /// messages from the router, until the admin channel closes.
    pub async fn run(
        mut self,
        listener: TcpListener,
        mut events_rx: mpsc::Receiver<PeerEvent>,
        mut admin_rx: mpsc::Receiver<NodeMsg>,
        dial_target: Option<String>,
    ) {
        if let Some(target) = dial_target {
            if let Err(e) = self.dial(&target).await {
                warn!(%target, error = %e, "failed to dial entry peer");
            }
        }

        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        debug!(%remote, "accepted peer stream");
                        self.track(stream);
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                event = events_rx.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => return,
                },
                admin = admin_rx.recv() => match admin {
                    Some(msg) => self.handle_admin(msg).await,
                    None => {
                        info!("admin channel closed, peering exiting");
                        return;
                    }
                },
            }
        }
    }

    /// Spawn reader/writer tasks for a fresh stream. The connection stays
    /// unregistered until a hello names it.
    fn track(&mut self, stream: TcpStream) -> ConnId {
        let id = self.next_conn;
        self.next_conn += 1;
        let conn = Connection::spawn(id, stream, self.events_tx.clone());
        self.conns.insert(id, conn);
        id
    }

    /// Connect out and open the handshake.
    async fn dial(&mut self, target: &str) -> Result<(), PeeringError> {
        if target == self.local_addr || self.peers.contains_key(target) {
            return Ok(());
        }
        let stream = TcpStream::connect(target).await?;
        let id = self.track(stream);
        self.seen.insert(target.to_string());
        let hello = WireMsg::Hello(self.hello_data());
        self.send_to(id, hello);
        info!(%target, "dialed peer");
        Ok(())
    }

    /// The local address plus roots `1..=top`.
    fn hello_data(&self) -> HelloData {
        let mut roots = Vec::with_capacity(self.top as usize);
        for h in 1..=self.top {
            if let Some(root) = self.roots.get(&h) {
                roots.push(*root);
            }
        }
        HelloData {
            addr: self.local_addr.clone(),
            roots,
        }
    }

    async fn handle_event(&mut self, event: PeerEvent) {
        match event {
            PeerEvent::Msg { conn, msg } => self.handle_msg(conn, msg).await,
            PeerEvent::RemoveMe { conn } => self.remove_conn(conn),
        }
    }

    async fn handle_msg(&mut self, conn: ConnId, msg: WireMsg) {
        match msg {
            WireMsg::Hello(hello) => {
                debug!(conn, peer = %hello.addr, "received hello");
                if !self.register(conn, &hello.addr) {
                    return;
                }
                let response = WireMsg::HelloRes(self.hello_data());
                self.send_to(conn, response);
                self.share_peers(conn);
                self.reconcile(conn, &hello).await;
            }
            WireMsg::HelloRes(hello) => {
                debug!(conn, peer = %hello.addr, "received hello response");
                if !self.register(conn, &hello.addr) {
                    return;
                }
                self.reconcile(conn, &hello).await;
            }
            WireMsg::Candidate(block) => {
                let _ = self.serv_tx.send(NodeMsg::RemoteCandidate(block)).await;
            }
            WireMsg::Block(block) => {
                debug!(conn, height = block.height, "received block");
                let miner = block
                    .transactions
                    .first()
                    .map(|t| t.receiver)
                    .unwrap_or(Hash::ZERO);
                let _ = self.serv_tx.send(NodeMsg::AddBlock { block, miner }).await;
            }
            WireMsg::RangeReq(first) => {
                let Some(addr) = self.conns.get(&conn).and_then(|c| c.addr.clone()) else {
                    warn!(conn, "range request from unregistered peer");
                    return;
                };
                debug!(peer = %addr, first, "peer requested a block range");
                // one outstanding request per peer, newest wins
                self.pending_ranges.retain(|pending| pending != &addr);
                self.pending_ranges.push_back(addr);
                let _ = self.serv_tx.send(NodeMsg::RangeReq(first)).await;
            }
            WireMsg::Peers(addrs) => self.merge_peers(addrs).await,
        }
    }

    /// Bind a connection to the address its hello advertised.
    ///
    /// Duplicate registrations are settled with a tie-break both ends
    /// compute identically: the side whose address sorts higher keeps its
    /// existing connection. Returns `false` when this connection lost and
    /// was closed.
    fn register(&mut self, conn: ConnId, addr: &str) -> bool {
        if let Some(&existing) = self.peers.get(addr) {
            if existing == conn {
                return true;
            }
            if addr > self.local_addr.as_str() {
                debug!(peer = %addr, "duplicate connection, keeping existing");
                self.remove_conn(conn);
                return false;
            }
            debug!(peer = %addr, "duplicate connection, replacing existing");
            self.remove_conn(existing);
        }

        self.seen.insert(addr.to_string());
        if !self.targets.iter().any(|t| t == addr) {
            self.targets.push(addr.to_string());
        }
        self.peers.insert(addr.to_string(), conn);
        if let Some(c) = self.conns.get_mut(&conn) {
            c.addr = Some(addr.to_string());
        }
        info!(peer = %addr, "registered peer");
        true
    }

    /// Drop a connection and any registration bound to it.
    fn remove_conn(&mut self, conn: ConnId) {
        let Some(c) = self.conns.remove(&conn) else {
            return;
        };
        if let Some(addr) = &c.addr {
            if self.peers.get(addr) == Some(&conn) {
                self.peers.remove(addr);
                self.targets.retain(|t| t != addr);
                self.pending_ranges.retain(|pending| pending != addr);
                info!(peer = %addr, "peer removed");
            }
        }
        c.close();
    }

    /// The divergence rule: when the remote chain is longer, truncate the
    /// local view to the fork point and fetch the rest from that peer.
    async fn reconcile(&mut self, conn: ConnId, remote: &HelloData) {
        if remote.height() <= self.top {
            return;
        }
        let fork = self.fork_point(&remote.roots);
        info!(
            fork,
            remote_top = remote.height(),
            local_top = self.top,
            "remote chain is longer, catching up"
        );
        self.top = fork;
        self.roots.retain(|height, _| *height <= fork);
        let _ = self.serv_tx.send(NodeMsg::RemoveBlocks(fork + 1)).await;
        self.send_to(conn, WireMsg::RangeReq(fork + 1));
    }

    /// Highest height at which both chains carry the same merkle root;
    /// genesis always agrees.
    fn fork_point(&self, remote_roots: &[Hash]) -> u64 {
        let mut h = self.top;
        while h > 0 {
            if remote_roots.get(h as usize - 1) == self.roots.get(&h) {
                return h;
            }
            h -= 1;
        }
        0
    }

    async fn handle_admin(&mut self, msg: NodeMsg) {
        match msg {
            NodeMsg::ShareBlock(block) => self.share_block(block),
            NodeMsg::CandidateBlock(block) => self.broadcast(WireMsg::Candidate(block)),
            NodeMsg::Range(blocks) => self.serve_range(blocks),
            other => debug!(?other, "peering ignoring admin message"),
        }
    }

    /// Record an accepted block's root and gossip it, unless the height is
    /// already cached (a block seen before is not re-gossiped).
    fn share_block(&mut self, block: Block) {
        if self.roots.contains_key(&block.height) {
            debug!(height = block.height, "block already shared, suppressing gossip");
            return;
        }
        self.roots.insert(block.height, block.merkle_root);
        if block.height > self.top {
            self.top = block.height;
        }
        self.gossip(WireMsg::Block(block));
    }

    /// Deliver a ledger range to the peer that asked for it, one block
    /// message per element in ascending order.
    fn serve_range(&mut self, blocks: Vec<Block>) {
        let Some(addr) = self.pending_ranges.pop_front() else {
            warn!("block range with no peer awaiting it");
            return;
        };
        let Some(&conn) = self.peers.get(&addr) else {
            debug!(peer = %addr, "peer vanished before its range was served");
            return;
        };
        debug!(peer = %addr, count = blocks.len(), "serving block range");
        for block in blocks {
            self.send_to(conn, WireMsg::Block(block));
        }
    }

    /// Learn addresses from a peer list, dial a shuffled selection up to
    /// the peer goal, and pass the merged list on.
    async fn merge_peers(&mut self, addrs: Vec<String>) {
        let fresh: Vec<String> = addrs
            .into_iter()
            .filter(|a| a != &self.local_addr && !self.seen.contains(a))
            .collect();
        if fresh.is_empty() {
            return;
        }
        for addr in &fresh {
            self.seen.insert(addr.clone());
        }

        let mut candidates = fresh.clone();
        candidates.shuffle(&mut rand::thread_rng());
        let want = GOAL_PEERS.saturating_sub(self.peers.len());
        for addr in candidates.iter().take(want) {
            if let Err(e) = self.dial(addr).await {
                debug!(peer = %addr, error = %e, "could not dial discovered peer");
            }
        }

        let mut merged = self.targets.clone();
        for addr in fresh {
            if !merged.contains(&addr) {
                merged.push(addr);
            }
        }
        self.gossip(WireMsg::Peers(merged));
    }

    /// Hand the registered target list to a newly registered peer.
    fn share_peers(&self, conn: ConnId) {
        if self.targets.is_empty() {
            return;
        }
        self.send_to(conn, WireMsg::Peers(self.targets.clone()));
    }

    /// Forward to a uniform random subset of `GOSSIP_FANOUT` registered
    /// peers, or to everyone when fewer are connected.
    fn gossip(&mut self, msg: WireMsg) {
        let ids: Vec<ConnId> = self.peers.values().copied().collect();
        let sample: Vec<ConnId> = if ids.len() <= GOSSIP_FANOUT {
            ids
        } else {
            ids.choose_multiple(&mut rand::thread_rng(), GOSSIP_FANOUT)
                .copied()
                .collect()
        };
        for id in sample {
            self.send_to(id, msg.clone());
        }
    }

    /// Forward to every registered peer.
    fn broadcast(&mut self, msg: WireMsg) {
        let ids: Vec<ConnId> = self.peers.values().copied().collect();
        for id in ids {
            self.send_to(id, msg.clone());
        }
    }

    fn send_to(&self, conn: ConnId, msg: WireMsg) {
        if let Some(c) = self.conns.get(&conn) {
            c.send(msg);
        }
    }
}
