//! JSON-RPC Wallet Client
//!
//! Talks EIP-1193 style JSON-RPC over HTTP to a wallet endpoint: a local
//! desktop wallet (Frame listens on 127.0.0.1:1248) or a remote signing
//! bridge. HTTP has no push channel, so account and chain changes are picked
//! up by a background watcher and republished as `ProviderEvent`s.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::types::{RpcReceipt, RpcRequest, RpcResponse};
use crate::config::loader::DEFAULT_INJECTED_URL;
use crate::domain::normalize_chain_id;
use crate::ports::{
    ProviderError, ProviderEvent, ProviderKind, TxReceipt, TxRequest, WalletConnector, WalletProvider,
};

const EVENT_CAPACITY: usize = 32;

/// JSON-RPC wallet configuration
#[derive(Debug, Clone)]
pub struct JsonRpcConfig {
    /// Wallet (or bridge) endpoint that signs
    pub url: String,
    pub kind: ProviderKind,
    /// Endpoint for reads and receipts; the wallet endpoint when `None`
    pub read_url: Option<String>,
    /// Per-request HTTP timeout. Signing prompts wait on the user, so this is
    /// generous.
    pub timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub receipt_timeout: Duration,
    pub watch_interval: Duration,
}

impl Default for JsonRpcConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_INJECTED_URL.to_string(),
            kind: ProviderKind::Injected,
            read_url: None,
            timeout: Duration::from_secs(300),
            receipt_poll_interval: Duration::from_secs(1),
            receipt_timeout: Duration::from_secs(750),
            watch_interval: Duration::from_secs(2),
        }
    }
}

/// One JSON-RPC endpoint
#[derive(Debug, Clone)]
struct RpcTransport {
    http: Client,
    url: String,
    next_id: Arc<AtomicU64>,
}

impl RpcTransport {
    fn new(http: Client, url: String, next_id: Arc<AtomicU64>) -> Self {
        Self { http, url, next_id }
    }

    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ProviderError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest::new(id, method, params);
        tracing::debug!(id, method, url = %self.url, "wallet rpc request");

        let response = self
            .http
            .post(&self.url)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ProviderError::Transport(format!("HTTP {}: {}", status, text)));
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", method, e)))?;

        if let Some(error) = envelope.error {
            tracing::debug!(id, method, code = error.code, "wallet rpc error: {}", error.message);
            return Err(error.into());
        }

        serde_json::from_value(envelope.result)
            .map_err(|e| ProviderError::InvalidResponse(format!("{}: {}", method, e)))
    }
}

/// Wallet reached over JSON-RPC
pub struct JsonRpcWallet {
    config: JsonRpcConfig,
    signer: RpcTransport,
    reader: RpcTransport,
    events: broadcast::Sender<ProviderEvent>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl JsonRpcWallet {
    pub fn new(config: JsonRpcConfig) -> Result<Self, ProviderError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        let next_id = Arc::new(AtomicU64::new(1));
        let signer = RpcTransport::new(http.clone(), config.url.clone(), next_id.clone());
        let reader = RpcTransport::new(
            http,
            config.read_url.clone().unwrap_or_else(|| config.url.clone()),
            next_id,
        );
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            config,
            signer,
            reader,
            events,
            watcher: Mutex::new(None),
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &JsonRpcConfig {
        &self.config
    }

    /// Start polling for account/chain changes. No-op if already running.
    fn start_watcher(&self) {
        let mut watcher = match self.watcher.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if watcher.is_some() || self.is_closed() {
            return;
        }

        let handle = tokio::spawn(watch_wallet(
            self.signer.clone(),
            self.events.clone(),
            self.config.watch_interval,
        ));
        *watcher = Some(handle);
    }

    fn stop_watcher(&self) {
        let handle = match self.watcher.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), ProviderError> {
        if self.is_closed() {
            Err(ProviderError::Closed)
        } else {
            Ok(())
        }
    }

    async fn poll_receipt(&self, hash: B256) -> Result<TxReceipt, ProviderError> {
        loop {
            self.ensure_open()?;
            let receipt: Option<RpcReceipt> = self
                .reader
                .request("eth_getTransactionReceipt", json!([hash]))
                .await?;

            if let Some(receipt) = receipt {
                return receipt.into_receipt();
            }
            tokio::time::sleep(self.config.receipt_poll_interval).await;
        }
    }
}

impl Drop for JsonRpcWallet {
    fn drop(&mut self) {
        self.stop_watcher();
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    fn kind(&self) -> ProviderKind {
        self.config.kind
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.ensure_open()?;
        let accounts: Vec<Address> = self.signer.request("eth_requestAccounts", json!([])).await?;
        self.start_watcher();
        Ok(accounts)
    }

    async fn chain_id(&self) -> Result<Value, ProviderError> {
        self.ensure_open()?;
        self.signer.request("eth_chainId", json!([])).await
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        self.ensure_open()?;
        self.reader
            .request("eth_call", json!([{ "to": to, "data": data }, "latest"]))
            .await
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<TxReceipt, ProviderError> {
        self.ensure_open()?;
        let hash: B256 = self.signer.request("eth_sendTransaction", json!([tx])).await?;
        tracing::info!(%hash, to = %tx.to, "Transaction broadcast, waiting for receipt");

        match tokio::time::timeout(self.config.receipt_timeout, self.poll_receipt(hash)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::ReceiptTimeout(hash)),
        }
    }

    async fn close(&self) -> Result<(), ProviderError> {
        self.closed.store(true, Ordering::SeqCst);
        self.stop_watcher();
        tracing::debug!(url = %self.config.url, "wallet session closed");
        Ok(())
    }
}

/// Poll `eth_accounts`/`eth_chainId` and publish changes.
///
/// The first poll only records a baseline. A transport failure means the
/// wallet went away: a `Disconnected` event is published and the watcher ends.
async fn watch_wallet(
    transport: RpcTransport,
    events: broadcast::Sender<ProviderEvent>,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut last_accounts: Option<Vec<Address>> = None;
    let mut last_chain: Option<u64> = None;

    loop {
        ticker.tick().await;

        let accounts = match transport.request::<Vec<Address>>("eth_accounts", json!([])).await {
            Ok(accounts) => accounts,
            Err(ProviderError::Transport(reason)) => {
                tracing::warn!("Wallet endpoint unreachable: {}", reason);
                let _ = events.send(ProviderEvent::Disconnected { code: None, reason });
                return;
            }
            Err(e) => {
                tracing::debug!("eth_accounts poll failed: {}", e);
                continue;
            }
        };

        if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
            let _ = events.send(ProviderEvent::AccountsChanged(accounts.clone()));
        }
        last_accounts = Some(accounts);

        let raw = match transport.request::<Value>("eth_chainId", json!([])).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!("eth_chainId poll failed: {}", e);
                continue;
            }
        };

        match normalize_chain_id(&raw) {
            Ok(chain_id) => {
                if last_chain.is_some_and(|prev| prev != chain_id) {
                    let _ = events.send(ProviderEvent::ChainChanged(raw));
                }
                last_chain = Some(chain_id);
            }
            Err(e) => tracing::debug!("ignoring unparseable chain id {}: {}", raw, e),
        }
    }
}

/// Connector opening `JsonRpcWallet` sessions
#[derive(Debug, Clone)]
pub struct JsonRpcConnector {
    config: JsonRpcConfig,
}

impl JsonRpcConnector {
    pub fn new(config: JsonRpcConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JsonRpcConfig {
        &self.config
    }
}

#[async_trait]
impl WalletConnector for JsonRpcConnector {
    async fn connect(&self) -> Result<Arc<dyn WalletProvider>, ProviderError> {
        tracing::info!(kind = %self.config.kind, url = %self.config.url, "Opening wallet session");
        let wallet = JsonRpcWallet::new(self.config.clone())?;
        Ok(Arc::new(wallet))
    }
}
