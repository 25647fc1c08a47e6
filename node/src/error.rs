use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("config error: {0}")]
    Config(#[from] ingot_types::ParamsError),

    #[error("wallet error: {0}")]
    Wallet(#[from] ingot_wallet::WalletError),

    #[error("peering error: {0}")]
    Peering(#[from] ingot_peering::PeeringError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
