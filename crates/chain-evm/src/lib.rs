//! Offline EVM chain support for the BSC adapter.
//!
//! This crate provides:
//! - Minimal ABI encoding and decoding, including ERC-20 call data
//! - EIP-55 addresses from secp256k1 public keys
//! - Non-hardened BIP32 derivation below an account root
//! - EIP-155 legacy and EIP-1559 signing, plus decoding back to transfer details
//! - EIP-191 message signing
//! - JSON-RPC quantity helpers and chain-id names
//!
//! Nothing in here touches the network.

pub mod abi;
pub mod address;
pub mod chains;
pub mod derivation;
pub mod erc20;
pub mod error;
pub mod message;
pub mod quantity;
pub mod signature;
pub mod transaction;

pub use alloy_primitives::U256;
pub use error::EvmError;
