//! ingot daemon: entry point for running an ingot node.

mod repl;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use ingot_node::{init_logging, wait_for_signal, IngotNode, NodeConfig, PeerMode};
use ingot_peering::entry;
use ingot_types::ProtocolParams;
use ingot_wallet::Wallet;

#[derive(Parser)]
#[command(name = "ingot-daemon", about = "ingot proof-of-work node daemon")]
struct Cli {
    /// Port to listen on for peer connections.
    #[arg(long, env = "INGOT_PORT")]
    port: u16,

    /// Entry peer to dial ("ip:port").
    #[arg(long, conflicts_with_all = ["auto", "nopeer"])]
    peer: Option<String>,

    /// Dial a random recorded bootstrap address.
    #[arg(long, conflicts_with = "nopeer")]
    auto: bool,

    /// Run without dialing anyone (first node of a network).
    #[arg(long)]
    nopeer: bool,

    /// Write a fresh root wallet and root transaction before starting.
    #[arg(long)]
    genroot: bool,

    /// Record this host's address in the bootstrap address book.
    #[arg(long)]
    append_host: bool,

    /// Path to the encoded root wallet.
    #[arg(long, env = "INGOT_ROOTWALL_PATH")]
    rootwall: PathBuf,

    /// Path to the encoded root transaction.
    #[arg(long, env = "INGOT_ROOTTRANS_PATH")]
    roottrans: PathBuf,

    /// Path to the append-only bootstrap address book.
    #[arg(long, env = "INGOT_ENTRYADDRS_PATH")]
    entryaddrs: PathBuf,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, default_value = "info", env = "INGOT_LOG_LEVEL")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let mode = match (&cli.peer, cli.auto, cli.nopeer) {
        (Some(target), false, false) => PeerMode::Peer(target.clone()),
        (None, true, false) => PeerMode::Auto,
        (None, false, true) => PeerMode::NoPeer,
        _ => bail!("specify exactly one of --peer, --auto, --nopeer"),
    };

    let params = ProtocolParams::from_env().context("protocol parameters")?;

    if cli.genroot {
        let root = Wallet::generate();
        ingot_wallet::save_wallet(&cli.rootwall, &root).context("write root wallet")?;
        let first = root.genesis_transaction().context("sign root transaction")?;
        ingot_wallet::save_transaction(&cli.roottrans, &first)
            .context("write root transaction")?;
        tracing::info!(address = %root.address(), "generated root wallet");
    }

    let config = NodeConfig {
        port: cli.port,
        mode,
        params,
        rootwall_path: cli.rootwall,
        roottrans_path: cli.roottrans,
        entryaddrs_path: cli.entryaddrs,
    };

    if cli.append_host {
        entry::append_entry_addr(&config.entryaddrs_path, &config.local_addr())
            .context("record host address")?;
    }

    let root_wallet = ingot_wallet::load_wallet(&config.rootwall_path)
        .context("load root wallet (run once with --genroot)")?;

    let (node, info_rx) = IngotNode::start(config).await.context("start node")?;

    repl::spawn(node.serv_tx.clone(), info_rx, root_wallet);

    wait_for_signal().await;
    node.shutdown().await;
    tracing::info!("ingot daemon exited cleanly");

    Ok(())
}
