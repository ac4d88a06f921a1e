//! ERC-20 tokens on top of the native protocol.
//!
//! [`Erc20Protocol`] wraps an [`EvmProtocol`] and routes balance, fee and
//! transfer operations through the token contract. Keys, message crypto,
//! status lookups and broadcast are the base protocol's.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chain_evm::address::checksum_address;
use chain_evm::derivation::{ExtendedPublicKey, ExtendedSecretKey};
use chain_evm::erc20::{decode_transfer, encode_transfer, is_blank_data};
use chain_evm::quantity::{parse_quantity, to_quantity};
use chain_evm::transaction::{RawTransaction, SignedTransaction, UnsignedTransaction};
use chain_evm::U256;
use evm_node::TransactionStatus;
use futures::future::try_join_all;
use tracing::warn;

use crate::builder::Asset;
use crate::config::ProtocolNetwork;
use crate::error::ProtocolError;
use crate::info::aggregate;
use crate::protocol::{single_detail, EvmProtocol, Protocol};
use crate::tokens::Erc20TokenMetadata;
use crate::types::{
    AnyTransaction, Balance, ExtendedKeyPair, FeeEstimate, KeyPair, ProtocolMetadata, PublicKey,
    SecretKey, TransactionCursor, TransactionDetails, TransactionsResult, TransferDescription,
    UnitMetadata, WalletConnectRequest,
};

pub struct Erc20Protocol {
    base: Arc<EvmProtocol>,
    token: Erc20TokenMetadata,
    metadata: ProtocolMetadata,
}

/// Token protocol for `metadata` sharing `base`'s node and keys.
pub fn create_erc20_token(metadata: Erc20TokenMetadata, base: Arc<EvmProtocol>) -> Erc20Protocol {
    Erc20Protocol::new(base, metadata)
}

impl Erc20Protocol {
    pub fn new(base: Arc<EvmProtocol>, token: Erc20TokenMetadata) -> Self {
        let metadata = ProtocolMetadata {
            identifier: token.identifier.clone(),
            name: token.name.clone(),
            units: vec![UnitMetadata::new(
                &token.symbol,
                Some(&token.market_symbol),
                token.decimals,
            )],
            main_unit: token.symbol.clone(),
            ..base.metadata().clone()
        };
        Self {
            base,
            token,
            metadata,
        }
    }

    pub fn token(&self) -> &Erc20TokenMetadata {
        &self.token
    }

    pub fn base(&self) -> &Arc<EvmProtocol> {
        &self.base
    }

    fn contract(&self) -> &str {
        &self.token.contract_address
    }

    fn asset(&self) -> Asset<'_> {
        Asset::Token {
            contract: self.contract(),
        }
    }

    // ─── On-chain metadata ───────────────────────────────────────────

    pub async fn name(&self) -> Result<Option<String>, ProtocolError> {
        Ok(self.base.node().contract_name(self.contract()).await?)
    }

    pub async fn symbol(&self) -> Result<Option<String>, ProtocolError> {
        Ok(self.base.node().contract_symbol(self.contract()).await?)
    }

    pub async fn decimals(&self) -> Result<Option<u8>, ProtocolError> {
        Ok(self.base.node().contract_decimals(self.contract()).await?)
    }

    /// A blank-data transfer becomes `transfer(to, value)` sent to the
    /// contract. Anything else is signed as given.
    fn as_token_transfer(&self, raw: &RawTransaction) -> Result<RawTransaction, ProtocolError> {
        if !is_blank_data(&raw.data) {
            if decode_transfer(&raw.data).is_err() {
                warn!(
                    contract = %self.contract(),
                    "signing token transaction whose data is not a transfer call"
                );
            }
            return Ok(raw.clone());
        }

        let amount = parse_quantity(&raw.value)?;
        Ok(RawTransaction {
            to: self.token.contract_address.clone(),
            value: to_quantity(U256::ZERO),
            data: encode_transfer(&raw.to, amount)?,
            ..raw.clone()
        })
    }
}

#[async_trait]
impl Protocol for Erc20Protocol {
    fn metadata(&self) -> &ProtocolMetadata {
        &self.metadata
    }

    fn address_from_public_key(&self, public_key: &PublicKey) -> Result<String, ProtocolError> {
        self.base.address_from_public_key(public_key)
    }

    fn derive_from_extended_public_key(
        &self,
        extended_public_key: &ExtendedPublicKey,
        visibility_index: u32,
        address_index: u32,
    ) -> Result<PublicKey, ProtocolError> {
        self.base
            .derive_from_extended_public_key(extended_public_key, visibility_index, address_index)
    }

    fn derive_from_extended_secret_key(
        &self,
        extended_secret_key: &ExtendedSecretKey,
        visibility_index: u32,
        address_index: u32,
    ) -> Result<SecretKey, ProtocolError> {
        self.base
            .derive_from_extended_secret_key(extended_secret_key, visibility_index, address_index)
    }

    fn extended_key_pair_from_seed(&self, seed: &[u8]) -> Result<ExtendedKeyPair, ProtocolError> {
        self.base.extended_key_pair_from_seed(seed)
    }

    /// Base details with the contract call decoded: `to` and `amount` are
    /// the token recipient and amount rather than the contract and zero.
    ///
    /// Call data other than `transfer(address,uint256)` is rejected with
    /// [`ProtocolError::InvalidValue`].
    fn details_from_transaction(
        &self,
        transaction: &AnyTransaction,
        public_key: &PublicKey,
    ) -> Result<Vec<TransferDescription>, ProtocolError> {
        let mut details = self.base.details_from_transaction(transaction, public_key)?;
        for detail in &mut details {
            let call = decode_transfer(&detail.arbitrary_data)?;
            detail.to = vec![checksum_address(&call.recipient)?];
            detail.amount = call.amount;
        }
        Ok(details)
    }

    fn sign_transaction(
        &self,
        transaction: &UnsignedTransaction,
        secret_key: &SecretKey,
    ) -> Result<SignedTransaction, ProtocolError> {
        match transaction {
            UnsignedTransaction::Raw(raw) => {
                let raw = self.as_token_transfer(raw)?;
                self.base
                    .sign_transaction(&UnsignedTransaction::Raw(raw), secret_key)
            }
            UnsignedTransaction::Typed(_) => Err(ProtocolError::condition(
                "typed transactions cannot be signed as token transfers",
            )),
        }
    }

    fn sign_message(&self, message: &str, key_pair: &KeyPair) -> Result<String, ProtocolError> {
        self.base.sign_message(message, key_pair)
    }

    fn verify_message(
        &self,
        message: &str,
        signature: &str,
        public_key: &PublicKey,
    ) -> Result<bool, ProtocolError> {
        self.base.verify_message(message, signature, public_key)
    }

    fn encrypt_asymmetric(&self, payload: &str, public_key: &PublicKey) -> Result<String, ProtocolError> {
        self.base.encrypt_asymmetric(payload, public_key)
    }

    fn decrypt_asymmetric(&self, payload: &str, key_pair: &KeyPair) -> Result<String, ProtocolError> {
        self.base.decrypt_asymmetric(payload, key_pair)
    }

    fn encrypt_aes(&self, payload: &str, secret_key: &SecretKey) -> Result<String, ProtocolError> {
        self.base.encrypt_aes(payload, secret_key)
    }

    fn decrypt_aes(&self, payload: &str, secret_key: &SecretKey) -> Result<String, ProtocolError> {
        self.base.decrypt_aes(payload, secret_key)
    }

    fn network(&self) -> &ProtocolNetwork {
        self.base.network()
    }

    async fn transactions_for_addresses(
        &self,
        addresses: &[String],
        limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<TransactionsResult, ProtocolError> {
        let info = self.base.info();
        let results = try_join_all(addresses.iter().map(|address| {
            info.fetch_contract_transactions(self.contract(), address, limit, cursor)
        }))
        .await?;
        Ok(aggregate(results, limit, self.network()))
    }

    async fn transaction_status(
        &self,
        hashes: &[String],
    ) -> Result<HashMap<String, TransactionStatus>, ProtocolError> {
        self.base.transaction_status(hashes).await
    }

    async fn balance_of_addresses(&self, addresses: &[String]) -> Result<Balance, ProtocolError> {
        let node = self.base.node();
        let balances = try_join_all(
            addresses
                .iter()
                .map(|address| node.call_balance_of(self.contract(), address)),
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
        self.base
            .token_balances_of_public_key(public_key, tokens)
            .await
    }

    /// The whole token balance; the fee is paid in the native coin.
    async fn max_transferable(
        &self,
        public_key: &PublicKey,
        _recipients: &[String],
        _fee: Option<U256>,
    ) -> Result<U256, ProtocolError> {
        Ok(self.balance_of_public_key(public_key).await?.available())
    }

    async fn estimate_fees(
        &self,
        public_key: &PublicKey,
        details: &[TransactionDetails],
    ) -> Result<FeeEstimate, ProtocolError> {
        let detail = single_detail(details)?;
        let from = self.address_from_public_key(public_key)?;
        self.base
            .builder()
            .estimate_fees(self.asset(), &from, detail)
            .await
    }

    async fn prepare_transaction(
        &self,
        public_key: &PublicKey,
        details: &[TransactionDetails],
        fee: Option<U256>,
    ) -> Result<UnsignedTransaction, ProtocolError> {
        let detail = single_detail(details)?;
        let from = self.address_from_public_key(public_key)?;
        self.base
            .builder()
            .prepare(self.asset(), &from, detail, fee)
            .await
    }

    async fn prepare_wallet_connect_transaction(
        &self,
        public_key: &PublicKey,
        request: &WalletConnectRequest,
    ) -> Result<UnsignedTransaction, ProtocolError> {
        self.base
            .prepare_wallet_connect_transaction(public_key, request)
            .await
    }

    async fn broadcast(&self, transaction: &SignedTransaction) -> Result<String, ProtocolError> {
        self.base.broadcast(transaction).await
    }
}
