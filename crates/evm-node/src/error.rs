use chain_evm::EvmError;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// JSON-RPC gateway errors.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Connection, timeout, non-2xx status or an unreadable body.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// An `error` object returned by the node in a successful HTTP response.
    #[error("node error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Well-formed JSON without the expected `result` shape.
    #[error("invalid node response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Abi(#[from] EvmError),
}

impl NodeError {
    pub fn network(message: impl Into<String>) -> Self {
        NodeError::Network {
            message: message.into(),
            source: None,
        }
    }

    pub fn network_with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        NodeError::Network {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// `true` for transport failures, as opposed to anything the node said.
    pub fn is_network(&self) -> bool {
        matches!(self, NodeError::Network { .. })
    }
}

impl From<reqwest::Error> for NodeError {
    fn from(e: reqwest::Error) -> Self {
        NodeError::network_with_source(e.to_string(), e)
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn display_network() {
        let err = NodeError::network("connection refused");
        assert_eq!(err.to_string(), "network error: connection refused");
        assert!(err.is_network());
    }

    #[test]
    fn network_keeps_its_cause() {
        let cause = std::io::Error::new(std::io::ErrorKind::TimedOut, "timed out");
        let err = NodeError::network_with_source("request failed", cause);
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("timed out"));
    }

    #[test]
    fn display_rpc() {
        let err = NodeError::Rpc {
            code: -32000,
            message: "nonce too low".into(),
        };
        assert_eq!(err.to_string(), "node error -32000: nonce too low");
        assert!(!err.is_network());
    }

    #[test]
    fn abi_errors_are_transparent() {
        let err: NodeError = EvmError::InvalidValue("bad word".into()).into();
        assert_eq!(err.to_string(), "invalid value: bad word");
    }
}
