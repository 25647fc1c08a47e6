//! Scripted-peer tests for the peering manager.

use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;

use ingot_ledger::{Block, Transaction};
use ingot_messages::NodeMsg;
use ingot_peering::wire::{read_frame, write_frame};
use ingot_peering::{HelloData, PeerServer, WireMsg};
use ingot_types::Hash;

const WAIT: Duration = Duration::from_secs(5);

struct Harness {
    addr: String,
    admin_tx: mpsc::Sender<NodeMsg>,
    serv_rx: mpsc::Receiver<NodeMsg>,
}

/// Start a peering manager on an ephemeral port with fake router channels.
async fn start_server() -> Harness {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    let (serv_tx, serv_rx) = mpsc::channel(64);
    let (admin_tx, admin_rx) = mpsc::channel(8);
    let (server, events_rx) = PeerServer::new(addr.clone(), serv_tx);
    tokio::spawn(server.run(listener, events_rx, admin_rx, None));
    Harness {
        addr,
        admin_tx,
        serv_rx,
    }
}

fn block_at(height: u64, root_tag: u8) -> Block {
    let mut t = Transaction::new(Hash::new([1u8; 32]), Hash::new([2u8; 32]), 1, height);
    t.seq = 1;
    let mut b = Block::candidate(height, Hash::ZERO, Hash::new([0xFF; 32]), vec![t]);
    b.merkle_root = Hash::new([root_tag; 32]);
    b
}

async fn recv_frame(stream: &mut TcpStream) -> WireMsg {
    timeout(WAIT, read_frame(stream)).await.unwrap().unwrap()
}

async fn recv_serv(rx: &mut mpsc::Receiver<NodeMsg>) -> NodeMsg {
    timeout(WAIT, rx.recv()).await.unwrap().unwrap()
}

/// Dial the server and complete a handshake under the given name.
async fn handshake(harness: &Harness, name: &str, roots: Vec<Hash>) -> TcpStream {
    let mut stream = TcpStream::connect(&harness.addr).await.unwrap();
    let hello = WireMsg::Hello(HelloData {
        addr: name.to_string(),
        roots,
    });
    write_frame(&mut stream, &hello).await.unwrap();
    match recv_frame(&mut stream).await {
        WireMsg::HelloRes(_) => stream,
        other => panic!("expected HelloRes, got {:?}", other),
    }
}

/// Drain frames until one matches; panics if `limit` frames pass first.
async fn expect_frame<F>(stream: &mut TcpStream, limit: usize, mut accept: F) -> WireMsg
where
    F: FnMut(&WireMsg) -> bool,
{
    for _ in 0..limit {
        let msg = recv_frame(stream).await;
        if accept(&msg) {
            return msg;
        }
    }
    panic!("expected frame not seen within {limit} messages");
}

#[tokio::test]
async fn handshake_yields_hello_response() {
    let harness = start_server().await;
    let mut stream = TcpStream::connect(&harness.addr).await.unwrap();
    let hello = WireMsg::Hello(HelloData {
        addr: "peer-a".into(),
        roots: Vec::new(),
    });
    write_frame(&mut stream, &hello).await.unwrap();

    match recv_frame(&mut stream).await {
        WireMsg::HelloRes(data) => {
            assert_eq!(data.addr, harness.addr);
            assert!(data.roots.is_empty());
        }
        other => panic!("expected HelloRes, got {:?}", other),
    }
}

#[tokio::test]
async fn longer_remote_chain_triggers_catch_up() {
    let mut harness = start_server().await;

    // local view: height 1 with root r1
    let local_b1 = block_at(1, 0x11);
    harness
        .admin_tx
        .send(NodeMsg::ShareBlock(local_b1))
        .await
        .unwrap();

    // remote claims height 3, agreeing at height 1
    let remote_roots = vec![
        Hash::new([0x11; 32]),
        Hash::new([0x22; 32]),
        Hash::new([0x33; 32]),
    ];
    let mut stream = handshake(&harness, "peer-a", remote_roots).await;

    match recv_serv(&mut harness.serv_rx).await {
        NodeMsg::RemoveBlocks(first) => assert_eq!(first, 2),
        other => panic!("expected RemoveBlocks, got {:?}", other),
    }
    let msg = expect_frame(&mut stream, 4, |m| matches!(m, WireMsg::RangeReq(_))).await;
    assert!(matches!(msg, WireMsg::RangeReq(2)));
}

#[tokio::test]
async fn diverged_remote_chain_truncates_to_the_fork() {
    let mut harness = start_server().await;

    harness
        .admin_tx
        .send(NodeMsg::ShareBlock(block_at(1, 0x11)))
        .await
        .unwrap();

    // remote is longer but disagrees from height 1 on: fork point is genesis
    let remote_roots = vec![Hash::new([0xAA; 32]), Hash::new([0xBB; 32])];
    let mut stream = handshake(&harness, "peer-a", remote_roots).await;

    match recv_serv(&mut harness.serv_rx).await {
        NodeMsg::RemoveBlocks(first) => assert_eq!(first, 1),
        other => panic!("expected RemoveBlocks, got {:?}", other),
    }
    let msg = expect_frame(&mut stream, 4, |m| matches!(m, WireMsg::RangeReq(_))).await;
    assert!(matches!(msg, WireMsg::RangeReq(1)));
}

#[tokio::test]
async fn shorter_remote_chain_changes_nothing() {
    let mut harness = start_server().await;
    harness
        .admin_tx
        .send(NodeMsg::ShareBlock(block_at(1, 0x11)))
        .await
        .unwrap();

    let _stream = handshake(&harness, "peer-a", Vec::new()).await;

    // registration must not produce any ledger traffic
    assert!(
        timeout(Duration::from_millis(300), harness.serv_rx.recv())
            .await
            .is_err()
    );
}

#[tokio::test]
async fn remote_block_feeds_the_ledger() {
    let mut harness = start_server().await;
    let mut stream = handshake(&harness, "peer-a", Vec::new()).await;

    write_frame(&mut stream, &WireMsg::Block(block_at(1, 0x42)))
        .await
        .unwrap();

    match recv_serv(&mut harness.serv_rx).await {
        NodeMsg::AddBlock { block, .. } => assert_eq!(block.height, 1),
        other => panic!("expected AddBlock, got {:?}", other),
    }
}

#[tokio::test]
async fn remote_candidate_is_retyped_for_the_router() {
    let mut harness = start_server().await;
    let mut stream = handshake(&harness, "peer-a", Vec::new()).await;

    write_frame(&mut stream, &WireMsg::Candidate(block_at(1, 0x42)))
        .await
        .unwrap();

    match recv_serv(&mut harness.serv_rx).await {
        NodeMsg::RemoteCandidate(block) => assert_eq!(block.height, 1),
        other => panic!("expected RemoteCandidate, got {:?}", other),
    }
}

#[tokio::test]
async fn range_request_is_served_in_order() {
    let mut harness = start_server().await;
    let mut stream = handshake(&harness, "peer-a", Vec::new()).await;

    write_frame(&mut stream, &WireMsg::RangeReq(1)).await.unwrap();
    match recv_serv(&mut harness.serv_rx).await {
        NodeMsg::RangeReq(first) => assert_eq!(first, 1),
        other => panic!("expected RangeReq, got {:?}", other),
    }

    // the ledger's reply flows back to the requesting peer
    harness
        .admin_tx
        .send(NodeMsg::Range(vec![block_at(1, 0x01), block_at(2, 0x02)]))
        .await
        .unwrap();

    let first = expect_frame(&mut stream, 4, |m| matches!(m, WireMsg::Block(_))).await;
    match first {
        WireMsg::Block(b) => assert_eq!(b.height, 1),
        _ => unreachable!(),
    }
    match recv_frame(&mut stream).await {
        WireMsg::Block(b) => assert_eq!(b.height, 2),
        other => panic!("expected Block, got {:?}", other),
    }
}

#[tokio::test]
async fn shared_block_gossips_once() {
    let harness = start_server().await;
    let mut stream = handshake(&harness, "peer-a", Vec::new()).await;

    let block = block_at(1, 0x42);
    harness
        .admin_tx
        .send(NodeMsg::ShareBlock(block.clone()))
        .await
        .unwrap();
    harness
        .admin_tx
        .send(NodeMsg::ShareBlock(block.clone()))
        .await
        .unwrap();
    // a candidate afterwards marks the end of the gossip window
    harness
        .admin_tx
        .send(NodeMsg::CandidateBlock(block_at(2, 0x43)))
        .await
        .unwrap();

    let first = expect_frame(&mut stream, 4, |m| {
        matches!(m, WireMsg::Block(_) | WireMsg::Candidate(_))
    })
    .await;
    assert!(matches!(first, WireMsg::Block(_)), "block gossiped once");
    let second = expect_frame(&mut stream, 4, |m| {
        matches!(m, WireMsg::Block(_) | WireMsg::Candidate(_))
    })
    .await;
    assert!(
        matches!(second, WireMsg::Candidate(_)),
        "duplicate share suppressed"
    );
}

#[tokio::test]
async fn candidates_are_broadcast_to_all_peers() {
    let harness = start_server().await;
    let mut a = handshake(&harness, "peer-a", Vec::new()).await;
    let mut b = handshake(&harness, "peer-b", Vec::new()).await;

    harness
        .admin_tx
        .send(NodeMsg::CandidateBlock(block_at(1, 0x42)))
        .await
        .unwrap();

    for stream in [&mut a, &mut b] {
        let msg = expect_frame(stream, 4, |m| matches!(m, WireMsg::Candidate(_))).await;
        assert!(matches!(msg, WireMsg::Candidate(_)));
    }
}

#[tokio::test]
async fn duplicate_peer_keeps_exactly_one_connection() {
    let harness = start_server().await;

    // "zzz" sorts above any "127.0.0.1:*" local address, so the server
    // keeps the first connection and closes the newcomer.
    let mut first = handshake(&harness, "zzz", Vec::new()).await;
    let mut second = TcpStream::connect(&harness.addr).await.unwrap();
    let hello = WireMsg::Hello(HelloData {
        addr: "zzz".into(),
        roots: Vec::new(),
    });
    write_frame(&mut second, &hello).await.unwrap();

    // the losing connection sees EOF instead of a handshake response
    assert!(timeout(WAIT, read_frame(&mut second)).await.unwrap().is_err());

    // the surviving connection still works
    write_frame(&mut first, &WireMsg::RangeReq(1)).await.unwrap();
    drop(first);
}

#[tokio::test]
async fn duplicate_peer_below_local_address_replaces_the_connection() {
    let harness = start_server().await;

    // "0.0.0.0:1" sorts below the local address: the newcomer wins.
    let first = handshake(&harness, "0.0.0.0:1", Vec::new()).await;
    let mut second = TcpStream::connect(&harness.addr).await.unwrap();
    let hello = WireMsg::Hello(HelloData {
        addr: "0.0.0.0:1".into(),
        roots: Vec::new(),
    });
    write_frame(&mut second, &hello).await.unwrap();

    match recv_frame(&mut second).await {
        WireMsg::HelloRes(_) => {}
        other => panic!("expected HelloRes, got {:?}", other),
    }
    drop(first);
}

#[tokio::test]
async fn peer_lists_merge_and_regossip() {
    let harness = start_server().await;
    let mut stream = handshake(&harness, "peer-a", Vec::new()).await;

    // an unseen address arrives; the dial will fail (nothing listens),
    // but the merged list must still be passed on
    write_frame(
        &mut stream,
        &WireMsg::Peers(vec!["127.0.0.1:1".into()]),
    )
    .await
    .unwrap();

    let msg = expect_frame(&mut stream, 6, |m| {
        matches!(m, WireMsg::Peers(addrs) if addrs.contains(&"127.0.0.1:1".to_string()))
    })
    .await;
    assert!(matches!(msg, WireMsg::Peers(_)));
}
