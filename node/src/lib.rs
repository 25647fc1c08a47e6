//! The full ingot node: router fabric, ledger task, miner thread and
//! peering, wired over bounded channels.

pub mod config;
pub mod error;
pub mod ledger_service;
pub mod logging;
pub mod node;
pub mod router;
pub mod shutdown;

pub use config::{NodeConfig, PeerMode};
pub use error::NodeError;
pub use logging::init_logging;
pub use node::IngotNode;
pub use shutdown::wait_for_signal;
