//! Fundamental types for the ingot protocol.
//!
//! This crate defines the types shared across every other crate in the
//! workspace: the 32-byte hash, the recoverable signature, and the
//! environment-derived protocol parameters.

pub mod hash;
pub mod keys;
pub mod params;

pub use hash::Hash;
pub use keys::Signature;
pub use params::{ParamsError, ProtocolParams};
