//! JSON-RPC 2.0 envelopes.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::NodeError;

pub const JSONRPC_VERSION: &str = "2.0";

pub const BLOCK_LATEST: &str = "latest";
pub const BLOCK_PENDING: &str = "pending";
pub const BLOCK_EARLIEST: &str = "earliest";

/// Id used for single (non-batched) requests.
pub const SINGLE_REQUEST_ID: u64 = 1;

#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: &'static str, params: Value) -> Self {
        Self::with_id(method, params, SINGLE_REQUEST_ID)
    }

    pub fn with_id(method: &'static str, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method,
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    /// Extracts `result`, turning an `error` object into [`NodeError::Rpc`].
    ///
    /// A JSON `null` result is returned as [`Value::Null`].
    pub fn into_result(self) -> Result<Value, NodeError> {
        if let Some(error) = self.error {
            return Err(NodeError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        Ok(self.result.unwrap_or(Value::Null))
    }
}

/// Parses a single response body.
pub fn parse_response(body: Value) -> Result<RpcResponse, NodeError> {
    if body.get("result").is_none() && body.get("error").is_none() {
        return Err(NodeError::InvalidResponse(format!(
            "response carries neither result nor error: {body}"
        )));
    }
    serde_json::from_value(body).map_err(|e| NodeError::InvalidResponse(e.to_string()))
}

/// Parses a batch response body. Items that do not parse are dropped.
pub fn parse_batch_response(body: Value) -> Result<Vec<RpcResponse>, NodeError> {
    match body {
        Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect()),
        other => Err(NodeError::InvalidResponse(format!(
            "expected a batch response array, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn request_serialization() {
        let request = RpcRequest::new("eth_gasPrice", json!([]));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"jsonrpc": "2.0", "method": "eth_gasPrice", "params": [], "id": 1})
        );
    }

    #[test]
    fn error_object_becomes_rpc_error() {
        let response = parse_response(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32000, "message": "already known"}
        }))
        .unwrap();
        match response.into_result() {
            Err(NodeError::Rpc { code, message }) => {
                assert_eq!(code, -32000);
                assert_eq!(message, "already known");
            }
            other => panic!("expected rpc error, got {other:?}"),
        }
    }

    #[test]
    fn null_result_is_kept() {
        let response = parse_response(json!({"jsonrpc": "2.0", "id": 1, "result": null})).unwrap();
        assert_eq!(response.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn missing_result_is_invalid() {
        assert!(matches!(
            parse_response(json!({"jsonrpc": "2.0", "id": 1})),
            Err(NodeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn batch_must_be_an_array() {
        assert!(parse_batch_response(json!({"result": "0x1"})).is_err());
        let items = parse_batch_response(json!([
            {"id": 1, "result": "0x1"},
            "garbage",
            {"id": 0, "result": "0x2"}
        ]))
        .unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].id, Some(0));
    }
}
