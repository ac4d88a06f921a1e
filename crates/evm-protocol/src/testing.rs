//! In-memory node and history doubles for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chain_evm::U256;
use evm_node::{GasEstimateRequest, NodeClient, NodeError, TransactionStatus};

use crate::error::ProtocolError;
use crate::info::{InfoClient, InfoTransactions};
use crate::types::TransactionCursor;

/// Secret key `0x46..46` and its address.
pub const SECRET: [u8; 32] = [0x46; 32];
pub const SENDER: &str = "0x9d8A62f656a8d1615C1294fd71e9CFb3E4855A4F";
pub const RECIPIENT: &str = "0xabababababababababababababababababababab";
pub const CONTRACT: &str = "0x55d398326f99059fF775485246999027B3197955";

pub fn sender_public_key() -> Vec<u8> {
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    k256::SecretKey::from_slice(&SECRET)
        .unwrap()
        .public_key()
        .to_encoded_point(true)
        .as_bytes()
        .to_vec()
}

#[derive(Debug, Clone, Copy)]
pub enum StatusReply {
    Status(TransactionStatus),
    NodeFailure,
    NetworkFailure,
}

#[derive(Default)]
pub struct MockNode {
    pub balances: HashMap<String, U256>,
    /// Keyed by `(contract, owner)`, both lowercase.
    pub token_balances: HashMap<(String, String), U256>,
    pub nonce: u64,
    pub gas: U256,
    pub transfer_gas: U256,
    pub gas_price: U256,
    pub statuses: HashMap<String, StatusReply>,
    pub token_name: Option<String>,
    pub token_decimals: Option<u8>,
    pub offline: bool,
    pub gas_requests: Mutex<Vec<GasEstimateRequest>>,
    pub transfer_gas_requests: Mutex<Vec<(String, String, String, U256)>>,
    pub broadcasts: Mutex<Vec<String>>,
    pub calls: Mutex<Vec<&'static str>>,
}

impl MockNode {
    pub fn with_balance(mut self, address: &str, balance: u128) -> Self {
        self.balances.insert(address.to_lowercase(), U256::from(balance));
        self
    }

    pub fn with_token_balance(mut self, contract: &str, owner: &str, balance: u128) -> Self {
        self.token_balances.insert(
            (contract.to_lowercase(), owner.to_lowercase()),
            U256::from(balance),
        );
        self
    }

    pub fn with_gas(mut self, gas: u64, transfer_gas: u64, gas_price: u64) -> Self {
        self.gas = U256::from(gas);
        self.transfer_gas = U256::from(transfer_gas);
        self.gas_price = U256::from(gas_price);
        self
    }

    pub fn called(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|m| **m == method).count()
    }

    fn record(&self, method: &'static str) -> Result<(), NodeError> {
        self.calls.lock().unwrap().push(method);
        if self.offline {
            return Err(NodeError::network("connection refused"));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeClient for MockNode {
    async fn fetch_balance(&self, address: &str) -> Result<U256, NodeError> {
        self.record("eth_getBalance")?;
        Ok(self
            .balances
            .get(&address.to_lowercase())
            .copied()
            .unwrap_or_default())
    }

    async fn fetch_transaction_count(&self, _address: &str) -> Result<u64, NodeError> {
        self.record("eth_getTransactionCount")?;
        Ok(self.nonce)
    }

    async fn send_signed_transaction(&self, raw: &str) -> Result<String, NodeError> {
        self.record("eth_sendRawTransaction")?;
        self.broadcasts.lock().unwrap().push(raw.to_string());
        chain_evm::transaction::transaction_hash(raw).map_err(NodeError::from)
    }

    async fn transaction_status(&self, hash: &str) -> Result<TransactionStatus, NodeError> {
        self.record("eth_getTransactionReceipt")?;
        match self.statuses.get(hash) {
            Some(StatusReply::Status(status)) => Ok(*status),
            Some(StatusReply::NodeFailure) => Err(NodeError::Rpc {
                code: -32000,
                message: "header not found".into(),
            }),
            Some(StatusReply::NetworkFailure) => Err(NodeError::network("timed out")),
            None => Ok(TransactionStatus::Unknown),
        }
    }

    async fn call_balance_of(&self, contract: &str, address: &str) -> Result<U256, NodeError> {
        self.record("eth_call")?;
        Ok(self
            .token_balances
            .get(&(contract.to_lowercase(), address.to_lowercase()))
            .copied()
            .unwrap_or_default())
    }

    async fn call_balance_of_on_contracts(
        &self,
        contracts: &[String],
        address: &str,
    ) -> Result<HashMap<String, U256>, NodeError> {
        self.record("eth_call_batch")?;
        Ok(contracts
            .iter()
            .filter_map(|contract| {
                self.token_balances
                    .get(&(contract.to_lowercase(), address.to_lowercase()))
                    .map(|balance| (contract.clone(), *balance))
            })
            .collect())
    }

    async fn estimate_transaction_gas(&self, request: &GasEstimateRequest) -> Result<U256, NodeError> {
        self.record("eth_estimateGas")?;
        self.gas_requests.lock().unwrap().push(request.clone());
        Ok(self.gas)
    }

    async fn estimate_transfer_gas(
        &self,
        contract: &str,
        from: &str,
        to: &str,
        amount: U256,
    ) -> Result<U256, NodeError> {
        self.record("eth_estimateGas")?;
        self.transfer_gas_requests.lock().unwrap().push((
            contract.to_string(),
            from.to_string(),
            to.to_string(),
            amount,
        ));
        Ok(self.transfer_gas)
    }

    async fn gas_price(&self) -> Result<U256, NodeError> {
        self.record("eth_gasPrice")?;
        Ok(self.gas_price)
    }

    async fn contract_name(&self, _contract: &str) -> Result<Option<String>, NodeError> {
        self.record("eth_call")?;
        Ok(self.token_name.clone())
    }

    async fn contract_symbol(&self, _contract: &str) -> Result<Option<String>, NodeError> {
        self.record("eth_call")?;
        Ok(None)
    }

    async fn contract_decimals(&self, _contract: &str) -> Result<Option<u8>, NodeError> {
        self.record("eth_call")?;
        Ok(self.token_decimals)
    }
}

/// History double serving canned pages keyed by lowercase address.
#[derive(Default)]
pub struct MockInfo {
    pub pages: HashMap<String, InfoTransactions>,
    pub requests: Mutex<Vec<(Option<String>, String, Option<u64>)>>,
}

impl MockInfo {
    fn lookup(&self, contract: Option<&str>, address: &str, cursor: Option<&TransactionCursor>) -> InfoTransactions {
        self.requests.lock().unwrap().push((
            contract.map(str::to_string),
            address.to_string(),
            cursor.and_then(|c| c.page),
        ));
        self.pages
            .get(&address.to_lowercase())
            .cloned()
            .unwrap_or(InfoTransactions {
                transactions: Vec::new(),
                page: 1,
            })
    }
}

#[async_trait]
impl InfoClient for MockInfo {
    async fn fetch_transactions(
        &self,
        address: &str,
        _limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<InfoTransactions, ProtocolError> {
        Ok(self.lookup(None, address, cursor))
    }

    async fn fetch_contract_transactions(
        &self,
        contract: &str,
        address: &str,
        _limit: usize,
        cursor: Option<&TransactionCursor>,
    ) -> Result<InfoTransactions, ProtocolError> {
        Ok(self.lookup(Some(contract), address, cursor))
    }
}
