use std::fmt;

use chain_evm::EvmError;
use crypto_utils::error::CryptoError;
use evm_node::NodeError;
use thiserror::Error;

/// Which balance could not cover a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceShortfall {
    /// The native coin balance cannot cover the amount and/or the fee.
    Native,
    /// The token balance cannot cover the transferred amount.
    Token,
}

impl fmt::Display for BalanceShortfall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceShortfall::Native => f.write_str("native"),
            BalanceShortfall::Token => f.write_str("token"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The node could not be reached or answered with garbage.
    #[error(transparent)]
    Network(NodeError),

    /// The node answered with a JSON-RPC error or an unexpected result.
    #[error(transparent)]
    Node(NodeError),

    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    #[error("condition violated: {0}")]
    ConditionViolation(String),

    #[error("not enough {0} balance")]
    Balance(BalanceShortfall),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

impl ProtocolError {
    pub fn condition(message: impl Into<String>) -> Self {
        ProtocolError::ConditionViolation(message.into())
    }

    pub fn is_network(&self) -> bool {
        matches!(self, ProtocolError::Network(_))
    }
}

impl From<NodeError> for ProtocolError {
    fn from(e: NodeError) -> Self {
        match e {
            NodeError::Abi(inner) => inner.into(),
            e if e.is_network() => ProtocolError::Network(e),
            e => ProtocolError::Node(e),
        }
    }
}

impl From<EvmError> for ProtocolError {
    fn from(e: EvmError) -> Self {
        match e {
            EvmError::InvalidPrivateKey(_)
            | EvmError::InvalidPublicKey(_)
            | EvmError::Derivation(_)
            | EvmError::Signing(_) => ProtocolError::InvalidKey(e.to_string()),
            EvmError::Unsupported(m) => ProtocolError::Unsupported(m),
            EvmError::InvalidValue(m) => ProtocolError::InvalidValue(m),
            EvmError::InvalidAddress(_) | EvmError::Encoding(_) => {
                ProtocolError::InvalidValue(e.to_string())
            }
        }
    }
}

impl From<toml::de::Error> for ProtocolError {
    fn from(e: toml::de::Error) -> Self {
        ProtocolError::InvalidValue(format!("config: {e}"))
    }
}
