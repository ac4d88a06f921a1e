use std::fmt;

use chain_evm::derivation::{ExtendedPublicKey, ExtendedSecretKey};
use chain_evm::transaction::{SignedTransaction, UnsignedTransaction};
use chain_evm::U256;
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::config::ProtocolNetwork;
use crate::error::ProtocolError;

// ─── Keys ────────────────────────────────────────────────────────────

/// A public key as handed to the protocol: final, or extended and still
/// waiting for a `(visibility, address)` index pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKey {
    /// SEC1 bytes, 33 (compressed) or 65 (uncompressed).
    Plain(Vec<u8>),
    Extended(ExtendedPublicKey),
}

impl PublicKey {
    pub fn from_hex(value: &str) -> Result<Self, ProtocolError> {
        let bytes = hex::decode(value.trim().trim_start_matches("0x"))
            .map_err(|e| ProtocolError::InvalidKey(format!("public key is not hex: {e}")))?;
        Ok(PublicKey::Plain(bytes))
    }

    /// Parses an `xpub` string.
    pub fn from_xpub(value: &str) -> Result<Self, ProtocolError> {
        Ok(PublicKey::Extended(value.parse()?))
    }
}

#[derive(Clone)]
pub enum SecretKey {
    /// 32 raw bytes.
    Plain(Zeroizing<Vec<u8>>),
    Extended(ExtendedSecretKey),
}

impl SecretKey {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        SecretKey::Plain(Zeroizing::new(bytes.to_vec()))
    }

    pub fn from_hex(value: &str) -> Result<Self, ProtocolError> {
        let bytes = Zeroizing::new(
            hex::decode(value.trim().trim_start_matches("0x"))
                .map_err(|_| ProtocolError::InvalidKey("secret key is not hex".into()))?,
        );
        Ok(SecretKey::Plain(bytes))
    }

    /// Parses an `xprv` string.
    pub fn from_xprv(value: &str) -> Result<Self, ProtocolError> {
        Ok(SecretKey::Extended(value.parse()?))
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretKey::Plain(_) => f.write_str("SecretKey::Plain(..)"),
            SecretKey::Extended(_) => f.write_str("SecretKey::Extended(..)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone)]
pub struct ExtendedKeyPair {
    pub secret_key: ExtendedSecretKey,
    pub public_key: ExtendedPublicKey,
}

// ─── Amounts ─────────────────────────────────────────────────────────

/// Balance in the smallest unit of the asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Balance {
    pub total: U256,
    /// Set when part of `total` is reserved and cannot be spent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transferable: Option<U256>,
}

impl Balance {
    pub fn new(total: U256) -> Self {
        Self {
            total,
            transferable: None,
        }
    }

    /// What can be spent: `transferable` when present, else `total`.
    pub fn available(&self) -> U256 {
        self.transferable.unwrap_or(self.total)
    }
}

/// Fee tiers in wei. `low <= medium <= high`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeEstimate {
    pub low: U256,
    pub medium: U256,
    pub high: U256,
}

/// One requested transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionDetails {
    pub to: String,
    pub amount: U256,
}

impl TransactionDetails {
    pub fn new(to: &str, amount: U256) -> Self {
        Self {
            to: to.to_string(),
            amount,
        }
    }
}

// ─── Transactions ────────────────────────────────────────────────────

/// Either side of signing, as accepted by `details_from_transaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnyTransaction {
    Unsigned(UnsignedTransaction),
    Signed(SignedTransaction),
}

impl From<UnsignedTransaction> for AnyTransaction {
    fn from(tx: UnsignedTransaction) -> Self {
        AnyTransaction::Unsigned(tx)
    }
}

impl From<SignedTransaction> for AnyTransaction {
    fn from(tx: SignedTransaction) -> Self {
        AnyTransaction::Signed(tx)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warning {
    pub title: String,
    pub description: String,
}

/// Human-readable description of one transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferDescription {
    pub from: Vec<String>,
    pub to: Vec<String>,
    pub is_inbound: bool,
    pub amount: U256,
    pub fee: U256,
    pub network: ProtocolNetwork,
    /// `0x`-prefixed call data.
    pub arbitrary_data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Warning>,
}

/// Paging state of a history query. Only `page` is forwarded to the
/// history provider; the core never interprets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionCursor {
    pub has_next: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionsResult {
    pub transactions: Vec<TransferDescription>,
    pub cursor: TransactionCursor,
}

/// An `eth_sendTransaction` request relayed by a dapp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletConnectRequest {
    #[serde(default)]
    pub from: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub gas_limit: Option<String>,
    #[serde(default)]
    pub gas_price: Option<String>,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub nonce: Option<String>,
}

// ─── Metadata ────────────────────────────────────────────────────────

/// One denomination of an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitMetadata {
    pub symbol: String,
    /// Ticker used by market data providers, if any.
    pub market: Option<String>,
    pub decimals: u8,
}

impl UnitMetadata {
    pub fn new(symbol: &str, market: Option<&str>, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            market: market.map(str::to_string),
            decimals,
        }
    }
}

/// Fees are always paid in the native coin, whatever the protocol's unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeMetadata {
    pub defaults: FeeEstimate,
    pub main_unit: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressFormat {
    pub is_case_sensitive: bool,
    pub placeholder: String,
    pub regex: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountMetadata {
    pub standard_derivation_path: String,
    pub address: AddressFormat,
}

/// Static description of a protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMetadata {
    pub identifier: String,
    pub name: String,
    pub units: Vec<UnitMetadata>,
    pub main_unit: String,
    pub fee: FeeMetadata,
    pub account: AccountMetadata,
    /// Name of the free-form field of a transaction.
    pub arbitrary_data_field: String,
}
