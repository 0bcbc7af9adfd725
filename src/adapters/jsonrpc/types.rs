//! JSON-RPC wire types

use alloy_primitives::{B256, U64};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ports::{ProviderError, TxReceipt, USER_REJECTED_CODE};

/// Outgoing request envelope
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Response envelope. `result` stays `Null` when absent so that a `null`
/// result (no receipt yet) is not confused with a malformed response.
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl From<RpcErrorObject> for ProviderError {
    fn from(err: RpcErrorObject) -> Self {
        if err.code == USER_REJECTED_CODE {
            ProviderError::UserRejected(err.message)
        } else {
            ProviderError::Rpc {
                code: err.code,
                message: err.message,
            }
        }
    }
}

/// Subset of `eth_getTransactionReceipt`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    /// `0x1` success, `0x0` reverted; absent on pre-Byzantium chains
    #[serde(default)]
    pub status: Option<U64>,
}

impl RpcReceipt {
    pub fn into_receipt(self) -> Result<TxReceipt, ProviderError> {
        let success = self.status.map_or(true, |s| s == U64::from(1u64));
        if !success {
            return Err(ProviderError::Reverted(self.transaction_hash));
        }

        Ok(TxReceipt {
            transaction_hash: self.transaction_hash,
            block_number: self.block_number.map(|b| b.to::<u64>()),
            success,
        })
    }
}
