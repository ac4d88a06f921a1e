use thiserror::Error;

/// EVM chain operation errors.
#[derive(Debug, Error)]
pub enum EvmError {
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(String),

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Malformed ABI payload, selector mismatch or an unparsable quantity.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A transaction type or ABI shape this crate does not handle.
    #[error("unsupported: {0}")]
    Unsupported(String),

    #[error("key derivation error: {0}")]
    Derivation(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("encoding error: {0}")]
    Encoding(String),
}

impl From<alloy_rlp::Error> for EvmError {
    fn from(e: alloy_rlp::Error) -> Self {
        EvmError::Encoding(format!("rlp: {e}"))
    }
}
