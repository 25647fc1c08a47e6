//! Node configuration assembled from flags and `INGOT_*` environment
//! variables by the daemon.

use std::path::PathBuf;

use ingot_types::ProtocolParams;

/// How the node joins the overlay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PeerMode {
    /// Dial a specific entry peer.
    Peer(String),
    /// Dial a random recorded bootstrap address.
    Auto,
    /// First node of a network: accept only.
    NoPeer,
}

#[derive(Clone, Debug)]
pub struct NodeConfig {
    /// Port the peering listener binds on.
    pub port: u16,
    pub mode: PeerMode,
    pub params: ProtocolParams,
    /// Encoded root wallet (`INGOT_ROOTWALL_PATH`).
    pub rootwall_path: PathBuf,
    /// Encoded root transaction (`INGOT_ROOTTRANS_PATH`).
    pub roottrans_path: PathBuf,
    /// Append-only bootstrap address book (`INGOT_ENTRYADDRS_PATH`).
    pub entryaddrs_path: PathBuf,
}

impl NodeConfig {
    /// The address this node advertises to peers.
    pub fn local_addr(&self) -> String {
        format!("127.0.0.1:{}", self.port)
    }
}
