//! BSC wallet protocol: native BNB and BEP-20/ERC-20 tokens.
//!
//! [`EvmProtocol`] ties the offline chain logic of `chain-evm` to an EVM node
//! ([`evm_node::NodeClient`]) and a history provider ([`InfoClient`]).
//! [`Erc20Protocol`] wraps it for one token contract. Both implement
//! [`Protocol`].

pub mod builder;
pub mod config;
pub mod erc20;
pub mod error;
pub mod fees;
pub mod info;
pub mod lifecycle;
pub mod protocol;
pub mod tokens;
pub mod types;

#[cfg(test)]
mod testing;

pub use builder::{Asset, TransactionBuilder};
pub use config::{NetworkType, ProtocolNetwork, ProtocolOptions};
pub use erc20::{create_erc20_token, Erc20Protocol};
pub use error::{BalanceShortfall, ProtocolError};
pub use info::{InfoClient, InfoTransactions};
pub use lifecycle::TransactionLifecycle;
pub use protocol::{EvmProtocol, Protocol};
pub use tokens::{known_tokens, Erc20TokenMetadata};
pub use types::*;

pub use chain_evm::transaction::{
    RawTransaction, SignedTransaction, TypedTransaction, UnsignedTransaction,
};
pub use chain_evm::U256;
pub use evm_node::TransactionStatus;
