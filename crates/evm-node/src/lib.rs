//! JSON-RPC gateway to an EVM node.
//!
//! [`HttpNodeClient`] turns balance, nonce, gas, call and broadcast requests
//! into JSON-RPC 2.0 bodies and sends them through an [`RpcTransport`].
//! Batched `balanceOf` lookups go out as one request and are matched back by
//! id.

pub mod client;
pub mod error;
pub mod rpc;
pub mod transport;

pub use client::{GasEstimateRequest, HttpNodeClient, NodeClient, TransactionStatus};
pub use error::NodeError;
pub use transport::{HttpTransport, RpcTransport};
