//! The protocol contract and its native-coin implementation.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chain_evm::address::address_from_public_key;
use chain_evm::chains::chain_name;
use chain_evm::derivation::{account_key_from_seed, path_tail, ExtendedPublicKey, ExtendedSecretKey};
use chain_evm::message::{sign_personal_message, verify_personal_message};
use chain_evm::quantity::{decode_hex_data, encode_hex_data, strip_hex_prefix};
use chain_evm::transaction::{
    self, decode_signed, decode_unsigned, SignedTransaction, UnsignedTransaction,
};
use chain_evm::U256;
use crypto_utils::{ecies, encryption};
use evm_node::{HttpNodeClient, NodeClient, TransactionStatus};
use futures::future::{join_all, try_join_all};
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::builder::{Asset, TransactionBuilder};
use crate::config::{ProtocolNetwork, ProtocolOptions};
use crate::error::ProtocolError;
use crate::fees::split_evenly;
use crate::info::{aggregate, InfoClient};
use crate::tokens::Erc20TokenMetadata;
use crate::types::{
    AccountMetadata, AddressFormat, AnyTransaction, Balance, ExtendedKeyPair, FeeEstimate,
    FeeMetadata, KeyPair, ProtocolMetadata, PublicKey, SecretKey, TransactionCursor,
    TransactionDetails, TransactionsResult, TransferDescription, Warning, WalletConnectRequest,
};

const WALLET_CONNECT_NAMESPACE: &str = "eip155";
const ETHEREUM_MAINNET_CHAIN_ID: u64 = 1;

/// Everything a wallet needs from one asset: key handling, signing and
/// message crypto offline; balances, history, fees and broadcast online.
#[async_trait]
pub trait Protocol: Send + Sync {
    // ─── Offline ─────────────────────────────────────────────────────

    fn metadata(&self) -> &ProtocolMetadata;

    fn address_from_public_key(&self, public_key: &PublicKey) -> Result<String, ProtocolError>;

    fn derive_from_extended_public_key(
        &self,
        extended_public_key: &ExtendedPublicKey,
        visibility_index: u32,
        address_index: u32,
    ) -> Result<PublicKey, ProtocolError>;

    fn derive_from_extended_secret_key(
        &self,
        extended_secret_key: &ExtendedSecretKey,
        visibility_index: u32,
        address_index: u32,
    ) -> Result<SecretKey, ProtocolError>;

    /// Account-root key pair under the standard derivation path.
    fn extended_key_pair_from_seed(&self, seed: &[u8]) -> Result<ExtendedKeyPair, ProtocolError>;

    fn details_from_transaction(
        &self,
        transaction: &AnyTransaction,
        public_key: &PublicKey,
    ) -> Result<Vec<TransferDescription>, ProtocolError>;

    fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
        secret_key: &SecretKey,
    ) -> Result<SignedTransaction, ProtocolError>;

    /// EIP-191 personal signature, `0x`-prefixed.
    fn sign_message(&self, message: &str, key_pair: &KeyPair) -> Result<String, ProtocolError>;

    fn verify_message(
        &self,
        message: &str,
        signature: &str,
        public_key: &PublicKey,
    ) -> Result<bool, ProtocolError>;

    fn encrypt_asymmetric(&self, payload: &str, public_key: &PublicKey) -> Result<String, ProtocolError>;

    fn decrypt_asymmetric(&self, payload: &str, key_pair: &KeyPair) -> Result<String, ProtocolError>;

    fn encrypt_aes(&self, payload: &str, secret_key: &SecretKey) -> Result<String, ProtocolError>;

    fn decrypt_aes(&self, payload: &str, secret_key: &SecretKey) -> Result<String, ProtocolError>;

    // ─── Online ──────────────────────────────────────────────────────

    fn network(&self) -> &ProtocolNetwork;

    async fn transactions_for_public_key(
        &self,
        public_key: &PublicKey,
        limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<TransactionsResult, ProtocolError> {
        let address = self.address_from_public_key(public_key)?;
        self.transactions_for_address(&address, limit, cursor).await
    }

    async fn transactions_for_address(
        &self,
        address: &str,
        limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<TransactionsResult, ProtocolError> {
        self.transactions_for_addresses(&[address.to_string()], limit, cursor)
            .await
    }

    async fn transactions_for_addresses(
        &self,
        addresses: &[String],
        limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<TransactionsResult, ProtocolError>;

    /// Status per hash. A node-side failure for one hash reports it as
    /// unknown; a transport failure fails the whole lookup.
    async fn transaction_status(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, TransactionStatus>, ProtocolError>;

    async fn balance_of_public_key(&self, public_key: &PublicKey) -> Result<Balance, ProtocolError> {
        let address = self.address_from_public_key(public_key)?;
        self.balance_of_address(&address).await
    }

    async fn balance_of_address(&self, address: &str) -> Result<Balance, ProtocolError> {
        self.balance_of_addresses(&[address.to_string()]).await
    }

    /// Sum of the balances of `addresses`.
    async fn balance_of_addresses(&self, addresses: &[String]) -> Result<Balance, ProtocolError>;

    /// Token balances keyed by token identifier. Tokens the node did not
    /// report are left out.
    async fn token_balances_of_public_key(
        &self,
        public_key: &PublicKey,
        tokens: &[Erc20TokenMetadata],
    ) -> Result<HashMap<String, U256>, ProtocolError>;

    async fn max_transferable(
        &self,
        public_key: &PublicKey,
        recipients: &[String],
        fee: Option<U256>,
    ) -> Result<U256, ProtocolError>;

    async fn estimate_fees(
        &self,
        public_key: &PublicKey,
        details: &[TransactionDetails],
    ) -> Result<FeeEstimate, ProtocolError>;

    /// Builds an unsigned transaction for exactly one transfer, paying `fee`
    /// or the medium estimate.
    async fn prepare_transaction(
        &self,
        public_key: &PublicKey,
        details: &[TransactionDetails],
        fee: Option<U256>,
    ) -> Result<UnsignedTransaction, ProtocolError>;

    /// CAIP-2 id of the network, e.g. `eip155:56`.
    fn wallet_connect_chain(&self) -> String {
        format!("{WALLET_CONNECT_NAMESPACE}:{}", self.network().chain_id)
    }

    async fn prepare_wallet_connect_transaction(
        &self,
        public_key: &PublicKey,
        request: &WalletConnectRequest,
    ) -> Result<UnsignedTransaction, ProtocolError>;

    /// Sends the signed bytes and returns the transaction hash.
    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<String, ProtocolError>;
}

pub(crate) fn single_detail(details: &[TransactionDetails]) -> Result<&TransactionDetails, ProtocolError> {
    match details {
        [detail] => Ok(detail),
        _ => Err(ProtocolError::condition(format!(
            "exactly one transaction detail is required, got {}",
            details.len()
        ))),
    }
}

impl ProtocolMetadata {
    pub fn from_options(options: &ProtocolOptions) -> Self {
        Self {
            identifier: options.identifier.clone(),
            name: options.name.clone(),
            units: options.units.clone(),
            main_unit: options.main_unit.clone(),
            fee: FeeMetadata {
                defaults: options.fee_defaults,
                main_unit: "BNB".into(),
            },
            account: AccountMetadata {
                standard_derivation_path: options.standard_derivation_path.clone(),
                address: AddressFormat {
                    is_case_sensitive: false,
                    placeholder: "0xabc...".into(),
                    regex: "^0x[a-fA-F0-9]{40}$".into(),
                },
            },
            arbitrary_data_field: "data".into(),
        }
    }
}

/// Native-coin protocol over a node and a history provider.
pub struct EvmProtocol {
    options: ProtocolOptions,
    metadata: ProtocolMetadata,
    node: Arc<dyn NodeClient>,
    info: Arc<dyn InfoClient>,
    builder: TransactionBuilder,
}

impl EvmProtocol {
    pub fn new(
        node: Arc<dyn NodeClient>,
        info: Arc<dyn InfoClient>,
        options: ProtocolOptions,
    ) -> Self {
        let builder = TransactionBuilder::new(node.clone(), options.network.chain_id);
        Self {
            metadata: ProtocolMetadata::from_options(&options),
            options,
            node,
            info,
            builder,
        }
    }

    /// BSC protocol talking JSON-RPC to `network.rpc_url`.
    pub fn bsc(network: ProtocolNetwork, info: Arc<dyn InfoClient>) -> Result<Self, ProtocolError> {
        let node = HttpNodeClient::from_url(&network.rpc_url)?;
        Ok(Self::new(Arc::new(node), info, ProtocolOptions::bsc(network)))
    }

    pub fn options(&self) -> &ProtocolOptions {
        &self.options
    }

    pub fn node(&self) -> &Arc<dyn NodeClient> {
        &self.node
    }

    pub fn info(&self) -> &Arc<dyn InfoClient> {
        &self.info
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    /// Plain SEC1 bytes; extended keys are derived at `0/0`.
    pub(crate) fn plain_public_key(&self, public_key: &PublicKey) -> Result<Vec<u8>, ProtocolError> {
        match public_key {
            PublicKey::Plain(bytes) => Ok(bytes.clone()),
            PublicKey::Extended(extended) => Ok(extended.derive_plain(0, 0)?.to_vec()),
        }
    }

    pub(crate) fn plain_secret_key(
        &self,
        secret_key: &SecretKey,
    ) -> Result<Zeroizing<Vec<u8>>, ProtocolError> {
        match secret_key {
            SecretKey::Plain(bytes) => Ok(bytes.clone()),
            SecretKey::Extended(extended) => {
                let derived = Zeroizing::new(extended.derive_plain(0, 0)?);
                Ok(Zeroizing::new(derived.to_vec()))
            }
        }
    }

    /// Address that prepared `unsigned`, given the caller's key.
    ///
    /// With an extended key, raw transactions are attributed to `0/0` and
    /// typed ones to the tail of their derivation path.
    fn own_address(
        &self,
        unsigned: &UnsignedTransaction,
        public_key: &PublicKey,
    ) -> Result<String, ProtocolError> {
        let key = match (public_key, unsigned) {
            (PublicKey::Plain(bytes), _) => bytes.clone(),
            (PublicKey::Extended(extended), UnsignedTransaction::Raw(_)) => {
                extended.derive_plain(0, 0)?.to_vec()
            }
            (PublicKey::Extended(extended), UnsignedTransaction::Typed(typed)) => {
                let (visibility, address) = path_tail(&typed.derivation_path).ok_or_else(|| {
                    ProtocolError::InvalidValue(format!(
                        "derivation path {:?} does not end in two plain indices",
                        typed.derivation_path
                    ))
                })?;
                extended.derive_plain(visibility, address)?.to_vec()
            }
        };
        Ok(address_from_public_key(&key)?)
    }

    fn describe_signed(&self, signed: &SignedTransaction) -> Result<TransferDescription, ProtocolError> {
        let decoded = decode_signed(&signed.serialized)?;
        let to = decoded
            .to
            .ok_or_else(|| ProtocolError::condition("transaction has no recipient"))?;

        Ok(TransferDescription {
            from: decoded.from.into_iter().collect(),
            to: vec![to],
            is_inbound: false,
            amount: decoded.value,
            fee: decoded.fee,
            network: self.options.network.clone(),
            arbitrary_data: encode_hex_data(&decoded.data),
            hash: decoded.hash,
            chain_id: decoded.chain_id,
            nonce: Some(decoded.nonce),
            warnings: Vec::new(),
        })
    }

    fn describe_unsigned(
        &self,
        unsigned: &UnsignedTransaction,
        own_address: String,
    ) -> Result<TransferDescription, ProtocolError> {
        let decoded = decode_unsigned(unsigned)?;
        let to = decoded
            .to
            .ok_or_else(|| ProtocolError::condition("transaction has no recipient"))?;

        let mut warnings = Vec::new();
        if let (UnsignedTransaction::Typed(_), Some(chain_id)) = (unsigned, decoded.chain_id) {
            if chain_id != ETHEREUM_MAINNET_CHAIN_ID {
                warnings.push(Warning {
                    title: "Chain ID".into(),
                    description: format!(
                        "Please note that this is not an Ethereum Mainnet transaction, it is from {}",
                        chain_name(chain_id)
                    ),
                });
            }
        }

        Ok(TransferDescription {
            from: vec![own_address],
            to: vec![to],
            is_inbound: false,
            amount: decoded.value,
            fee: decoded.fee,
            network: self.options.network.clone(),
            arbitrary_data: encode_hex_data(&decoded.data),
            hash: None,
            chain_id: decoded.chain_id,
            nonce: Some(decoded.nonce),
            warnings,
        })
    }
}

#[async_trait]
impl Protocol for EvmProtocol {
    fn metadata(&self) -> &ProtocolMetadata {
        &self.metadata
    }

    fn address_from_public_key(&self, public_key: &PublicKey) -> Result<String, ProtocolError> {
        Ok(address_from_public_key(&self.plain_public_key(public_key)?)?)
    }

    fn derive_from_extended_public_key(
        &self,
        extended_public_key: &ExtendedPublicKey,
        visibility_index: u32,
        address_index: u32,
    ) -> Result<PublicKey, ProtocolError> {
        let key = extended_public_key.derive_plain(visibility_index, address_index)?;
        Ok(PublicKey::Plain(key.to_vec()))
    }

    fn derive_from_extended_secret_key(
        &self,
        extended_secret_key: &ExtendedSecretKey,
        visibility_index: u32,
        address_index: u32,
    ) -> Result<SecretKey, ProtocolError> {
        let key = Zeroizing::new(extended_secret_key.derive_plain(visibility_index, address_index)?);
        Ok(SecretKey::from_bytes(key.as_slice()))
    }

    fn extended_key_pair_from_seed(&self, seed: &[u8]) -> Result<ExtendedKeyPair, ProtocolError> {
        let secret_key = account_key_from_seed(seed, &self.options.standard_derivation_path)?;
        let public_key = secret_key.to_public()?;
        Ok(ExtendedKeyPair {
            secret_key,
            public_key,
        })
    }

    fn details_from_transaction(
        &self,
        transaction: &AnyTransaction,
        public_key: &PublicKey,
    ) -> Result<Vec<TransferDescription>, ProtocolError> {
        let description = match transaction {
            AnyTransaction::Signed(signed) => self.describe_signed(signed)?,
            AnyTransaction::Unsigned(unsigned) => {
                let own_address = self.own_address(unsigned, public_key)?;
                self.describe_unsigned(unsigned, own_address)?
            }
        };
        Ok(vec![description])
    }

    fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
        secret_key: &SecretKey,
    ) -> Result<SignedTransaction, ProtocolError> {
        let secret = self.plain_secret_key(secret_key)?;
        let signed = transaction::sign(transaction, &secret)?;
        let hash = signed.hash()?;
        info!(hash = %hash, "signed transaction");
        Ok(signed)
    }

    fn sign_message(&self, message: &str, key_pair: &KeyPair) -> Result<String, ProtocolError> {
        let secret = self.plain_secret_key(&key_pair.secret_key)?;
        let signature = sign_personal_message(message.as_bytes(), &secret)?;
        Ok(encode_hex_data(&signature))
    }

    fn verify_message(
        &self,
        message: &str,
        signature: &str,
        public_key: &PublicKey,
    ) -> Result<bool, ProtocolError> {
        let signature = decode_hex_data(signature)?;
        let address = self.address_from_public_key(public_key)?;
        Ok(verify_personal_message(message.as_bytes(), &signature, &address)?)
    }

    fn encrypt_asymmetric(&self, payload: &str, public_key: &PublicKey) -> Result<String, ProtocolError> {
        Ok(ecies::encrypt_hex(payload, &self.plain_public_key(public_key)?)?)
    }

    fn decrypt_asymmetric(&self, payload: &str, key_pair: &KeyPair) -> Result<String, ProtocolError> {
        let secret = self.plain_secret_key(&key_pair.secret_key)?;
        Ok(ecies::decrypt_hex(payload, &secret)?)
    }

    fn encrypt_aes(&self, payload: &str, secret_key: &SecretKey) -> Result<String, ProtocolError> {
        let secret = self.plain_secret_key(secret_key)?;
        Ok(encryption::encrypt_with_secret_key(payload, &secret)?)
    }

    fn decrypt_aes(&self, payload: &str, secret_key: &SecretKey) -> Result<String, ProtocolError> {
        let secret = self.plain_secret_key(secret_key)?;
        Ok(encryption::decrypt_with_secret_key(payload, &secret)?)
    }

    fn network(&self) -> &ProtocolNetwork {
        &self.options.network
    }

    async fn transactions_for_addresses(
        &self,
        addresses: &[String],
        limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<TransactionsResult, ProtocolError> {
        let results = try_join_all(
            addresses
                .iter()
                .map(|address| self.info.fetch_transactions(address, limit, cursor)),
        )
        .await?;
        Ok(aggregate(results, limit, &self.options.network))
    }

    async fn transaction_status(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, TransactionStatus>, ProtocolError> {
        let replies = join_all(hashes.iter().map(|hash| self.node.transaction_status(hash))).await;

        let mut statuses = HashMap::with_capacity(hashes.len());
        for (hash, reply) in hashes.iter().zip(replies) {
            let status = match reply {
                Ok(status) => status,
                Err(e) if e.is_network() => return Err(e.into()),
                Err(e) => {
                    warn!(hash = %hash, error = %e, "status lookup failed, reporting unknown");
                    TransactionStatus::Unknown
                }
            };
            statuses.insert(hash.clone(), status);
        }
        Ok(statuses)
    }

    async fn balance_of_addresses(&self, addresses: &[String]) -> Result<Balance, ProtocolError> {
        let balances = try_join_all(
            addresses
                .iter()
                .map(|address| self.node.fetch_balance(address)),
        )
        .await?;
        let total = balances
            .into_iter()
            .fold(U256::ZERO, |sum, balance| sum.saturating_add(balance));
        Ok(Balance::new(total))
    }

    async fn token_balances_of_public_key(
        &self,
        public_key: &PublicKey,
        tokens: &[Erc20TokenMetadata],
    ) -> Result<HashMap<String, U256>, ProtocolError> {
        let address = self.address_from_public_key(public_key)?;
        let contracts: Vec<String> = tokens.iter().map(|t| t.contract_address.clone()).collect();
        let balances = self
            .node
            .call_balance_of_on_contracts(&contracts, &address)
            .await?;

        Ok(tokens
            .iter()
            .filter_map(|token| {
                balances
                    .get(&token.contract_address)
                    .map(|balance| (token.identifier.clone(), *balance))
            })
            .collect())
    }

    /// Balance minus the medium fee of sending an even share of it to each
    /// recipient, never below zero.
    async fn max_transferable(
        &self,
        public_key: &PublicKey,
        recipients: &[String],
        fee: Option<U256>,
    ) -> Result<U256, ProtocolError> {
        let available = self.balance_of_public_key(public_key).await?.available();

        let fee = match fee {
            Some(fee) => fee,
            None => {
                let recipient = recipients
                    .first()
                    .ok_or_else(|| ProtocolError::condition("at least one recipient is required"))?;
                let from = self.address_from_public_key(public_key)?;
                let share = split_evenly(available, recipients.len());
                self.builder
                    .estimate_fees(Asset::Native, &from, &TransactionDetails::new(recipient, share))
                    .await?
                    .medium
            }
        };

        Ok(available.saturating_sub(fee))
    }

    async fn estimate_fees(
        &self,
        public_key: &PublicKey,
        details: &[TransactionDetails],
    ) -> Result<FeeEstimate, ProtocolError> {
        let detail = single_detail(details)?;
        let from = self.address_from_public_key(public_key)?;
        self.builder.estimate_fees(Asset::Native, &from, detail).await
    }

    async fn prepare_transaction(
        &self,
        public_key: &PublicKey,
        details: &[TransactionDetails],
        fee: Option<U256>,
    ) -> Result<UnsignedTransaction, ProtocolError> {
        let detail = single_detail(details)?;
        let from = self.address_from_public_key(public_key)?;
        self.builder.prepare(Asset::Native, &from, detail, fee).await
    }

    async fn prepare_wallet_connect_transaction(
        &self,
        public_key: &PublicKey,
        request: &WalletConnectRequest,
    ) -> Result<UnsignedTransaction, ProtocolError> {
        let from = self.address_from_public_key(public_key)?;
        self.builder.prepare_wallet_connect(&from, request).await
    }

    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<String, ProtocolError> {
        let raw = format!("0x{}", strip_hex_prefix(transaction.serialized.trim()));
        let hash = self.node.send_signed_transaction(&raw).await?;
        info!(hash = %hash, network = %self.options.network.name, "broadcast transaction");
        Ok(hash)
    }
}
