//! Protocol parameters sourced from the environment.

use crate::Hash;
use std::env;
use thiserror::Error;

/// Environment variable holding the PoW difficulty (0..=32).
pub const DIFFICULTY_ENV: &str = "INGOT_DIFFICULTY";
/// Environment variable holding the coinbase reward amount.
pub const REWARD_ENV: &str = "INGOT_REWARD";

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },

    #[error("difficulty {0} exceeds the 32-byte target")]
    DifficultyRange(usize),
}

/// Chain-wide constants every node must agree on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolParams {
    /// Number of leading `0xFF` bytes in the PoW target.
    pub difficulty: usize,
    /// Amount the coinbase pays the miner of each block.
    pub reward: u32,
}

impl ProtocolParams {
    pub fn new(difficulty: usize, reward: u32) -> Result<Self, ParamsError> {
        if difficulty > Hash::SIZE {
            return Err(ParamsError::DifficultyRange(difficulty));
        }
        Ok(Self { difficulty, reward })
    }

    /// Read `INGOT_DIFFICULTY` and `INGOT_REWARD`.
    pub fn from_env() -> Result<Self, ParamsError> {
        Self::new(
            read_env(DIFFICULTY_ENV)?,
            read_env(REWARD_ENV)?,
        )
    }

    /// The PoW threshold: `difficulty` bytes of `0xFF`, then `0x00`.
    pub fn target(&self) -> Hash {
        let mut bytes = [0u8; Hash::SIZE];
        for byte in bytes.iter_mut().take(self.difficulty) {
            *byte = 0xFF;
        }
        Hash::new(bytes)
    }
}

fn read_env<T: std::str::FromStr>(name: &'static str) -> Result<T, ParamsError> {
    let value = env::var(name).map_err(|_| ParamsError::Missing(name))?;
    value
        .parse()
        .map_err(|_| ParamsError::Invalid { name, value })
}
