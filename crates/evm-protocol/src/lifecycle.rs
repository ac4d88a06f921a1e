//! Lifecycle of a single outgoing transaction.
//!
//! Every transition consumes the current state, so a prepared transaction
//! is signed at most once and a signed one broadcast at most once.

use chain_evm::transaction::{SignedTransaction, UnsignedTransaction};
use chain_evm::U256;
use evm_node::TransactionStatus;
use tracing::debug;

use crate::error::ProtocolError;
use crate::protocol::Protocol;
use crate::types::{PublicKey, SecretKey, TransactionDetails};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionLifecycle {
    Requested { details: TransactionDetails },
    Prepared { unsigned: UnsignedTransaction },
    Signed { signed: SignedTransaction },
    Broadcast { hash: String },
    Confirmed { hash: String },
    Failed { hash: String },
}

impl TransactionLifecycle {
    pub fn requested(details: TransactionDetails) -> Self {
        Self::Requested { details }
    }

    fn state(&self) -> &'static str {
        match self {
            Self::Requested { .. } => "requested",
            Self::Prepared { .. } => "prepared",
            Self::Signed { .. } => "signed",
            Self::Broadcast { .. } => "broadcast",
            Self::Confirmed { .. } => "confirmed",
            Self::Failed { .. } => "failed",
        }
    }

    fn invalid(&self, transition: &str) -> ProtocolError {
        ProtocolError::condition(format!(
            "cannot {transition} a transaction in state {}",
            self.state()
        ))
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Confirmed { .. } | Self::Failed { .. })
    }

    /// Hash once the transaction has been broadcast.
    pub fn hash(&self) -> Option<&str> {
        match self {
            Self::Broadcast { hash } | Self::Confirmed { hash } | Self::Failed { hash } => {
                Some(hash)
            }
            _ => None,
        }
    }

    pub async fn prepare<P: Protocol + ?Sized>(
        self,
        protocol: &P,
        public_key: &PublicKey,
        fee: Option<U256>,
    ) -> Result<Self, ProtocolError> {
        let details = match self {
            Self::Requested { details } => details,
            other => return Err(other.invalid("prepare")),
        };
        let unsigned = protocol
            .prepare_transaction(public_key, std::slice::from_ref(&details), fee)
            .await?;
        Ok(Self::Prepared { unsigned })
    }

    pub fn sign<P: Protocol + ?Sized>(
        self,
        protocol: &P,
        secret_key: &SecretKey,
    ) -> Result<Self, ProtocolError> {
        let unsigned = match self {
            Self::Prepared { unsigned } => unsigned,
            other => return Err(other.invalid("sign")),
        };
        let signed = protocol.sign_transaction(&unsigned, secret_key)?;
        Ok(Self::Signed { signed })
    }

    pub async fn broadcast<P: Protocol + ?Sized>(self, protocol: &P) -> Result<Self, ProtocolError> {
        let signed = match self {
            Self::Signed { signed } => signed,
            other => return Err(other.invalid("broadcast")),
        };
        let hash = protocol.broadcast(&signed).await?;
        Ok(Self::Broadcast { hash })
    }

    /// Asks the node for the outcome. An unknown status keeps the
    /// transaction in `Broadcast`.
    pub async fn refresh<P: Protocol + ?Sized>(self, protocol: &P) -> Result<Self, ProtocolError> {
        let hash = match self {
            Self::Broadcast { hash } => hash,
            other => return Err(other.invalid("refresh")),
        };
        let statuses = protocol.transaction_status(std::slice::from_ref(&hash)).await?;
        let status = statuses
            .get(&hash)
            .copied()
            .unwrap_or(TransactionStatus::Unknown);
        debug!(hash = %hash, status = ?status, "refreshed transaction");

        Ok(match status {
            TransactionStatus::Applied => Self::Confirmed { hash },
            TransactionStatus::Failed => Self::Failed { hash },
            TransactionStatus::Unknown => Self::Broadcast { hash },
        })
    }
}
