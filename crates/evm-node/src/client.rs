use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chain_evm::abi::{decode_dynamic_bytes, decode_uint256};
use chain_evm::erc20::{
    encode_balance_of, encode_transfer, encode_view_call, DECIMALS_SIGNATURE, NAME_SIGNATURE,
    SYMBOL_SIGNATURE,
};
use chain_evm::quantity::{parse_quantity, strip_hex_prefix, to_quantity};
use chain_evm::U256;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::NodeError;
use crate::rpc::{parse_batch_response, parse_response, RpcRequest, BLOCK_LATEST};
use crate::transport::{HttpTransport, RpcTransport};

/// Outcome of a broadcast transaction as seen by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Applied,
    Failed,
    /// No receipt yet.
    Unknown,
}

/// Parameters of an `eth_estimateGas` call. Absent fields are omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GasEstimateRequest {
    pub from: String,
    pub to: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

impl GasEstimateRequest {
    pub fn new(from: &str, to: &str) -> Self {
        Self {
            from: from.to_string(),
            to: to.to_string(),
            ..Self::default()
        }
    }

    pub fn value(mut self, value: U256) -> Self {
        self.value = Some(to_quantity(value));
        self
    }

    /// Blank data (`""` or `"0x"`) is left out.
    pub fn data(mut self, data: Option<&str>) -> Self {
        self.data = data
            .filter(|d| !strip_hex_prefix(d).is_empty())
            .map(str::to_string);
        self
    }

    pub fn gas_cap(mut self, gas: U256) -> Self {
        self.gas = Some(to_quantity(gas));
        self
    }
}

/// Read and broadcast primitives of an EVM node.
#[async_trait]
pub trait NodeClient: Send + Sync {
    /// Native balance in wei (`eth_getBalance`, latest block).
    async fn fetch_balance(&self, address: &str) -> Result<U256, NodeError>;

    /// `eth_getTransactionCount` at the latest block.
    async fn fetch_transaction_count(&self, address: &str) -> Result<u64, NodeError>;

    /// `eth_sendRawTransaction`; returns the transaction hash.
    async fn send_signed_transaction(&self, raw: &str) -> Result<String, NodeError>;

    async fn transaction_status(&self, hash: &str) -> Result<TransactionStatus, NodeError>;

    async fn call_balance_of(&self, contract: &str, address: &str) -> Result<U256, NodeError>;

    /// Token balances of `address` on several contracts in one batch.
    ///
    /// Every contract is present in the result; contracts the node did not
    /// answer for resolve to zero.
    async fn call_balance_of_on_contracts(
        &self,
        contracts: &[String],
        address: &str,
    ) -> Result<HashMap<String, U256>, NodeError>;

    async fn estimate_transaction_gas(&self, request: &GasEstimateRequest) -> Result<U256, NodeError>;

    /// Gas of a `transfer(to, amount)` call on `contract`, without value or cap.
    async fn estimate_transfer_gas(
        &self,
        contract: &str,
        from: &str,
        to: &str,
        amount: U256,
    ) -> Result<U256, NodeError>;

    async fn gas_price(&self) -> Result<U256, NodeError>;

    async fn contract_name(&self, contract: &str) -> Result<Option<String>, NodeError>;

    async fn contract_symbol(&self, contract: &str) -> Result<Option<String>, NodeError>;

    async fn contract_decimals(&self, contract: &str) -> Result<Option<u8>, NodeError>;
}

/// [`NodeClient`] speaking JSON-RPC through an [`RpcTransport`].
#[derive(Clone)]
pub struct HttpNodeClient {
    transport: Arc<dyn RpcTransport>,
}

impl HttpNodeClient {
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }

    /// Client over HTTPS with default timeouts.
    pub fn from_url(url: &str) -> Result<Self, NodeError> {
        Ok(Self::new(Arc::new(HttpTransport::new(url)?)))
    }

    async fn send(&self, request: RpcRequest) -> Result<Value, NodeError> {
        debug!(
            method = request.method,
            id = request.id,
            endpoint = self.transport.endpoint(),
            "sending JSON-RPC request"
        );

        let body = serde_json::to_value(&request)
            .map_err(|e| NodeError::InvalidResponse(format!("cannot serialize request: {e}")))?;
        let reply = self.transport.post(body).await?;
        parse_response(reply)?.into_result()
    }

    async fn send_quantity(&self, request: RpcRequest) -> Result<U256, NodeError> {
        let method = request.method;
        let result = self.send(request).await?;
        quantity_result(method, &result)
    }

    async fn call(&self, contract: &str, data: String) -> Result<Value, NodeError> {
        self.send(RpcRequest::new("eth_call", call_params(contract, data)))
            .await
    }

    async fn call_string(&self, contract: &str, signature: &str) -> Result<Option<String>, NodeError> {
        let result = self.call(contract, encode_view_call(signature)).await?;
        let Some(payload) = non_empty_data(&result) else {
            return Ok(None);
        };

        let bytes = decode_dynamic_bytes(payload)?;
        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| NodeError::InvalidResponse(format!("{signature} is not UTF-8: {e}")))
    }
}

fn call_params(contract: &str, data: String) -> Value {
    json!([{ "to": contract, "data": data }, BLOCK_LATEST])
}

fn quantity_result(method: &str, result: &Value) -> Result<U256, NodeError> {
    let text = result
        .as_str()
        .ok_or_else(|| NodeError::InvalidResponse(format!("{method} result is not a string: {result}")))?;
    Ok(parse_quantity(text)?)
}

/// `None` for `null`, `""` and `"0x"` call results.
fn non_empty_data(result: &Value) -> Option<&str> {
    result.as_str().filter(|s| !strip_hex_prefix(s).is_empty())
}

#[async_trait]
impl NodeClient for HttpNodeClient {
    async fn fetch_balance(&self, address: &str) -> Result<U256, NodeError> {
        self.send_quantity(RpcRequest::new("eth_getBalance", json!([address, BLOCK_LATEST])))
            .await
    }

    async fn fetch_transaction_count(&self, address: &str) -> Result<u64, NodeError> {
        let count = self
            .send_quantity(RpcRequest::new(
                "eth_getTransactionCount",
                json!([address, BLOCK_LATEST]),
            ))
            .await?;
        u64::try_from(count)
            .map_err(|_| NodeError::InvalidResponse(format!("transaction count {count} overflows u64")))
    }

    async fn send_signed_transaction(&self, raw: &str) -> Result<String, NodeError> {
        let result = self
            .send(RpcRequest::new("eth_sendRawTransaction", json!([raw])))
            .await?;
        result
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| NodeError::InvalidResponse(format!("transaction hash is not a string: {result}")))
    }

    async fn transaction_status(&self, hash: &str) -> Result<TransactionStatus, NodeError> {
        let receipt = self
            .send(RpcRequest::new("eth_getTransactionReceipt", json!([hash])))
            .await?;

        if receipt.is_null() {
            return Ok(TransactionStatus::Unknown);
        }

        match receipt.get("status").and_then(Value::as_str) {
            Some("0x1") => Ok(TransactionStatus::Applied),
            _ => Ok(TransactionStatus::Failed),
        }
    }

    async fn call_balance_of(&self, contract: &str, address: &str) -> Result<U256, NodeError> {
        let result = self.call(contract, encode_balance_of(address)?).await?;
        match non_empty_data(&result) {
            Some(word) => Ok(decode_uint256(word)?),
            None => Ok(U256::ZERO),
        }
    }

    async fn call_balance_of_on_contracts(
        &self,
        contracts: &[String],
        address: &str,
    ) -> Result<HashMap<String, U256>, NodeError> {
        let mut balances: HashMap<String, U256> =
            contracts.iter().map(|c| (c.clone(), U256::ZERO)).collect();
        if contracts.is_empty() {
            return Ok(balances);
        }

        let data = encode_balance_of(address)?;
        let requests = contracts
            .iter()
            .enumerate()
            .map(|(index, contract)| {
                RpcRequest::with_id("eth_call", call_params(contract, data.clone()), index as u64)
            })
            .collect::<Vec<_>>();

        debug!(
            calls = requests.len(),
            endpoint = self.transport.endpoint(),
            "sending batched balanceOf"
        );

        let body = serde_json::to_value(&requests)
            .map_err(|e| NodeError::InvalidResponse(format!("cannot serialize batch: {e}")))?;
        let reply = self.transport.post(body).await?;

        // Nodes may reorder batch replies, so match them up by id.
        for response in parse_batch_response(reply)? {
            let Some(contract) = response
                .id
                .and_then(|id| usize::try_from(id).ok())
                .and_then(|index| contracts.get(index))
            else {
                warn!(id = ?response.id, "batch reply with unknown id");
                continue;
            };

            let balance = response
                .into_result()
                .and_then(|result| match non_empty_data(&result) {
                    Some(word) => Ok(decode_uint256(word)?),
                    None => Ok(U256::ZERO),
                });

            match balance {
                Ok(balance) => {
                    balances.insert(contract.clone(), balance);
                }
                Err(e) => warn!(contract = %contract, error = %e, "balanceOf failed, using 0"),
            }
        }

        Ok(balances)
    }

    async fn estimate_transaction_gas(&self, request: &GasEstimateRequest) -> Result<U256, NodeError> {
        self.send_quantity(RpcRequest::new("eth_estimateGas", json!([request])))
            .await
    }

    async fn estimate_transfer_gas(
        &self,
        contract: &str,
        from: &str,
        to: &str,
        amount: U256,
    ) -> Result<U256, NodeError> {
        let data = encode_transfer(to, amount)?;
        let request = GasEstimateRequest::new(from, contract).data(Some(&data));
        self.estimate_transaction_gas(&request).await
    }

    async fn gas_price(&self) -> Result<U256, NodeError> {
        self.send_quantity(RpcRequest::new("eth_gasPrice", json!([])))
            .await
    }

    async fn contract_name(&self, contract: &str) -> Result<Option<String>, NodeError> {
        self.call_string(contract, NAME_SIGNATURE).await
    }

    async fn contract_symbol(&self, contract: &str) -> Result<Option<String>, NodeError> {
        self.call_string(contract, SYMBOL_SIGNATURE).await
    }

    async fn contract_decimals(&self, contract: &str) -> Result<Option<u8>, NodeError> {
        let result = self.call(contract, encode_view_call(DECIMALS_SIGNATURE)).await?;
        let Some(word) = non_empty_data(&result) else {
            return Ok(None);
        };

        let decimals = decode_uint256(word)?;
        u8::try_from(decimals)
            .map(Some)
            .map_err(|_| NodeError::InvalidResponse(format!("decimals {decimals} out of range")))
    }
}
