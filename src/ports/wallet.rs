//! Wallet provider port
//!
//! The contract every wallet backend implements, whether it is a locally
//! injected wallet or a remote signer reached through a bridge. Signing and
//! broadcasting happen on the other side of this trait.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::broadcast;

/// EIP-1193 error code for "user rejected the request"
pub const USER_REJECTED_CODE: i64 = 4001;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("No wallet provider available")]
    NoProvider,
    #[error("Wallet selection cancelled")]
    Cancelled,
    #[error("Request rejected by user: {0}")]
    UserRejected(String),
    #[error("Wallet RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Transaction {0} reverted")]
    Reverted(B256),
    #[error("Timed out waiting for receipt of {0}")]
    ReceiptTimeout(B256),
    #[error("Invalid wallet response: {0}")]
    InvalidResponse(String),
    #[error("Wallet session closed")]
    Closed,
}

/// How the wallet is reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Wallet running next to the app (browser extension or desktop wallet)
    Injected,
    /// Wallet reached through a pairing bridge
    Remote,
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Injected => write!(f, "injected"),
            ProviderKind::Remote => write!(f, "remote"),
        }
    }
}

/// Notifications pushed by the wallet
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<Address>),
    /// Raw chain id as reported (hex string or number)
    ChainChanged(Value),
    Disconnected { code: Option<i64>, reason: String },
}

/// State-changing call handed to the wallet for signing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
}

impl TxRequest {
    pub fn new(from: Address, to: Address, data: impl Into<Bytes>) -> Self {
        Self {
            from,
            to,
            data: data.into(),
        }
    }

    /// 4-byte function selector, if the calldata has one
    pub fn selector(&self) -> Option<[u8; 4]> {
        self.data.get(..4).and_then(|s| s.try_into().ok())
    }
}

/// Mined transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// A connected wallet
#[async_trait]
pub trait WalletProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Ask the wallet for its accounts; the first is the selected one
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Raw chain id, normalized by the caller
    async fn chain_id(&self) -> Result<Value, ProviderError>;

    /// Account, chain and disconnect notifications
    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;

    /// Read-only contract call against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError>;

    /// Sign, broadcast and wait for the receipt.
    ///
    /// Resolves once the transaction is mined; a reverted transaction is an
    /// error.
    async fn send_transaction(&self, tx: TxRequest) -> Result<TxReceipt, ProviderError>;

    /// Release the session. Further requests fail with `Closed`.
    async fn close(&self) -> Result<(), ProviderError>;
}

/// Opens wallet sessions
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WalletConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn WalletProvider>, ProviderError>;
}
