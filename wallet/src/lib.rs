//! Wallets: key material, address, transaction signing, and the framed
//! persistence for the root wallet and root transaction.

pub mod error;
pub mod store;
pub mod wallet;

pub use error::WalletError;
pub use store::{load_transaction, load_wallet, save_transaction, save_wallet};
pub use wallet::Wallet;
