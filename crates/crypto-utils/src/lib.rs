//! # crypto-utils
//!
//! Message encryption for the BSC adapter: AES-256-GCM under a key bound to
//! the signing key, and ECIES to a secp256k1 public key.

pub mod ecies;
pub mod encryption;
pub mod error;

pub use error::CryptoError;
