//! Assembles unsigned transactions from transfer details.

use std::sync::Arc;

use chain_evm::address::parse_address;
use chain_evm::erc20::encode_transfer;
use chain_evm::quantity::{to_quantity, u64_to_quantity};
use chain_evm::transaction::{RawTransaction, UnsignedTransaction};
use chain_evm::U256;
use evm_node::{GasEstimateRequest, NodeClient};
use tracing::info;

use crate::error::{BalanceShortfall, ProtocolError};
use crate::fees::{fee_tiers, gas_price_for_fee, MAX_GAS_ESTIMATE, WALLET_CONNECT_GAS_LIMIT};
use crate::types::{Balance, FeeEstimate, TransactionDetails, WalletConnectRequest};

/// What a transfer moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Asset<'a> {
    Native,
    /// An ERC-20 token; the fee is still paid in the native coin.
    Token { contract: &'a str },
}

#[derive(Clone)]
pub struct TransactionBuilder {
    node: Arc<dyn NodeClient>,
    chain_id: u64,
}

impl TransactionBuilder {
    pub fn new(node: Arc<dyn NodeClient>, chain_id: u64) -> Self {
        Self { node, chain_id }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Native transfers are estimated with a gas cap; token transfers are
    /// estimated as a `transfer` call on the contract.
    pub async fn estimate_gas(
        &self,
        asset: Asset<'_>,
        from: &str,
        to: &str,
        amount: U256,
        data: Option<&str>,
    ) -> Result<U256, ProtocolError> {
        let gas = match asset {
            Asset::Native => {
                let request = GasEstimateRequest::new(from, to)
                    .value(amount)
                    .data(data)
                    .gas_cap(U256::from(MAX_GAS_ESTIMATE));
                self.node.estimate_transaction_gas(&request).await?
            }
            Asset::Token { contract } => {
                self.node
                    .estimate_transfer_gas(contract, from, to, amount)
                    .await?
            }
        };
        Ok(gas)
    }

    pub async fn estimate_fees(
        &self,
        asset: Asset<'_>,
        from: &str,
        details: &TransactionDetails,
    ) -> Result<FeeEstimate, ProtocolError> {
        let gas = self
            .estimate_gas(asset, from, &details.to, details.amount, None)
            .await?;
        let gas_price = self.node.gas_price().await?;
        Ok(fee_tiers(gas, gas_price))
    }

    /// Builds a `Raw` transaction paying `fee` (or the medium estimate).
    ///
    /// Native transfers need `amount + fee` of native balance. Token
    /// transfers need `amount` of token balance and, separately, `fee` of
    /// native balance; each shortfall is reported on its own.
    pub async fn prepare(
        &self,
        asset: Asset<'_>,
        from: &str,
        details: &TransactionDetails,
        fee: Option<U256>,
    ) -> Result<UnsignedTransaction, ProtocolError> {
        parse_address(&details.to)?;

        let fee = match fee {
            Some(fee) => fee,
            None => self.estimate_fees(asset, from, details).await?.medium,
        };

        let (to, value, data) = match asset {
            Asset::Native => {
                let balance = Balance::new(self.node.fetch_balance(from).await?);
                if balance.available() < details.amount.saturating_add(fee) {
                    return Err(ProtocolError::Balance(BalanceShortfall::Native));
                }
                (details.to.clone(), details.amount, "0x".to_string())
            }
            Asset::Token { contract } => {
                let token = Balance::new(self.node.call_balance_of(contract, from).await?);
                if token.available() < details.amount {
                    return Err(ProtocolError::Balance(BalanceShortfall::Token));
                }
                let native = self.node.fetch_balance(from).await?;
                if native < fee {
                    return Err(ProtocolError::Balance(BalanceShortfall::Native));
                }
                let data = encode_transfer(&details.to, details.amount)?;
                (contract.to_string(), U256::ZERO, data)
            }
        };

        let gas_limit = self
            .estimate_gas(asset, from, &details.to, details.amount, None)
            .await?;
        let gas_price = gas_price_for_fee(fee, gas_limit)?;
        let nonce = self.node.fetch_transaction_count(from).await?;

        info!(
            chain_id = self.chain_id,
            nonce,
            to = %to,
            gas_limit = %gas_limit,
            gas_price = %gas_price,
            "prepared transaction"
        );

        Ok(UnsignedTransaction::Raw(RawTransaction {
            nonce: u64_to_quantity(nonce),
            gas_price: to_quantity(gas_price),
            gas_limit: to_quantity(gas_limit),
            to,
            value: to_quantity(value),
            chain_id: self.chain_id,
            data,
        }))
    }

    /// Turns a relayed dapp request into a `Raw` transaction. Fields the
    /// request carries are kept; a missing gas price or nonce is fetched,
    /// both concurrently.
    pub async fn prepare_wallet_connect(
        &self,
        from: &str,
        request: &WalletConnectRequest,
    ) -> Result<UnsignedTransaction, ProtocolError> {
        let gas_price = async {
            match &request.gas_price {
                Some(price) => Ok::<_, ProtocolError>(price.clone()),
                None => Ok(to_quantity(self.node.gas_price().await?)),
            }
        };
        let nonce = async {
            match &request.nonce {
                Some(nonce) => Ok::<_, ProtocolError>(nonce.clone()),
                None => Ok(u64_to_quantity(self.node.fetch_transaction_count(from).await?)),
            }
        };
        let (gas_price, nonce) = futures::try_join!(gas_price, nonce)?;

        info!(chain_id = self.chain_id, nonce = %nonce, "prepared wallet connect transaction");

        Ok(UnsignedTransaction::Raw(RawTransaction {
            nonce,
            gas_price,
            gas_limit: u64_to_quantity(WALLET_CONNECT_GAS_LIMIT),
            to: request.to.clone().unwrap_or_default(),
            value: request.value.clone().unwrap_or_else(|| "0x0".into()),
            chain_id: self.chain_id,
            data: request.data.clone().unwrap_or_else(|| "0x".into()),
        }))
    }
}
