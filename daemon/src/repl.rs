//! A minimal shell for manual testing on stdin.
//!
//! Commands: `wallet <name>`, `send <from> <to> <amount>`, `post`,
//! `height`. Wallets created here live only for the session.

use std::collections::HashMap;
use std::io::{self, BufRead, Write};
use std::thread;

use tokio::sync::mpsc;
use tracing::warn;

use ingot_messages::NodeMsg;
use ingot_wallet::Wallet;

pub fn spawn(
    serv_tx: mpsc::Sender<NodeMsg>,
    info_rx: mpsc::Receiver<NodeMsg>,
    miner_wallet: Wallet,
) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("ingot-repl".into())
        .spawn(move || run(serv_tx, info_rx, miner_wallet))
        .expect("spawn repl thread")
}

fn run(serv_tx: mpsc::Sender<NodeMsg>, mut info_rx: mpsc::Receiver<NodeMsg>, miner: Wallet) {
    let mut wallets: HashMap<String, Wallet> = HashMap::new();
    wallets.insert("miner".to_string(), miner);

    let stdin = io::stdin();
    prompt();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let words: Vec<&str> = line.split_whitespace().collect();
        match words.as_slice() {
            ["wallet", name] => {
                let wallet = wallets
                    .entry(name.to_string())
                    .or_insert_with(Wallet::generate);
                println!("{}", wallet.address());
            }
            ["send", from, to, amount] => {
                send(&serv_tx, &mut info_rx, &mut wallets, from, to, amount);
            }
            ["post"] => {
                if serv_tx.blocking_send(NodeMsg::GenCandidate).is_err() {
                    break;
                }
            }
            ["height"] => match query_height(&serv_tx, &mut info_rx) {
                Some(height) => println!("{height}"),
                None => break,
            },
            [] => {}
            _ => println!("-- invalid input"),
        }
        prompt();
    }
}

fn prompt() {
    print!("$: ");
    let _ = io::stdout().flush();
}

fn send(
    serv_tx: &mpsc::Sender<NodeMsg>,
    info_rx: &mut mpsc::Receiver<NodeMsg>,
    wallets: &mut HashMap<String, Wallet>,
    from: &str,
    to: &str,
    amount: &str,
) {
    let Ok(amount) = amount.parse::<u32>() else {
        println!("-- bad amount");
        return;
    };
    if !wallets.contains_key(from) || !wallets.contains_key(to) {
        println!("-- unknown wallet");
        return;
    }
    let Some(height) = query_height(serv_tx, info_rx) else {
        return;
    };
    let receiver = wallets[to].address();
    match wallets[from].transfer(receiver, amount, height + 1) {
        Ok(transaction) => {
            if serv_tx
                .blocking_send(NodeMsg::Transaction(transaction))
                .is_err()
            {
                warn!("node is gone, dropping transaction");
            }
        }
        Err(e) => println!("-- signing failed: {e}"),
    }
}

/// Ask the ledger for its height and wait for the reply on the info
/// channel; only this shell consumes that channel.
fn query_height(
    serv_tx: &mpsc::Sender<NodeMsg>,
    info_rx: &mut mpsc::Receiver<NodeMsg>,
) -> Option<u64> {
    serv_tx.blocking_send(NodeMsg::ReqHeight).ok()?;
    loop {
        match info_rx.blocking_recv()? {
            NodeMsg::Height(height) => return Some(height),
            _ => continue,
        }
    }
}
