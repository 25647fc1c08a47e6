use thiserror::Error;

#[derive(Debug, Error)]
pub enum PeeringError {
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("message of {0} bytes exceeds the frame limit")]
    Oversize(usize),

    #[error("no bootstrap addresses recorded")]
    NoEntryAddrs,
}
