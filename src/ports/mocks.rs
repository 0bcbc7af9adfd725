//! In-memory wallet for tests
//!
//! `MockWallet` records every transaction it is asked to sign and can be told
//! to fail calls by function selector. `MockConnector` hands it out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::broadcast;

use super::contracts::{APPROVE_SELECTOR, BALANCE_OF_SELECTOR, SWAP_SELECTOR};
use super::wallet::{
    ProviderError, ProviderEvent, ProviderKind, TxReceipt, TxRequest, WalletConnector, WalletProvider,
};

/// Mock wallet that records calls and allows controlled responses
#[derive(Debug)]
pub struct MockWallet {
    kind: ProviderKind,
    accounts: Mutex<Vec<Address>>,
    chain_id: Mutex<Value>,
    events: broadcast::Sender<ProviderEvent>,
    sent: Mutex<Vec<TxRequest>>,
    failures: Mutex<HashMap<[u8; 4], ProviderError>>,
    balances: Mutex<HashMap<Address, U256>>,
    next_block: AtomicU64,
    send_delay: Option<Duration>,
    close_calls: AtomicUsize,
    closed: AtomicBool,
}

impl MockWallet {
    pub fn new(account: Address, chain_id: impl Into<Value>) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            kind: ProviderKind::Injected,
            accounts: Mutex::new(vec![account]),
            chain_id: Mutex::new(chain_id.into()),
            events,
            sent: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
            next_block: AtomicU64::new(1),
            send_delay: None,
            close_calls: AtomicUsize::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Builder method to report a different provider kind
    pub fn with_kind(mut self, kind: ProviderKind) -> Self {
        self.kind = kind;
        self
    }

    /// Builder method to replace the reported accounts
    pub fn with_accounts(self, accounts: Vec<Address>) -> Self {
        *self.accounts.lock().unwrap() = accounts;
        self
    }

    /// Builder method to fail any transaction with the given selector
    pub fn with_failure(self, selector: [u8; 4], error: ProviderError) -> Self {
        self.failures.lock().unwrap().insert(selector, error);
        self
    }

    /// Builder method to reject the approval step
    pub fn failing_approval(self, error: ProviderError) -> Self {
        self.with_failure(APPROVE_SELECTOR, error)
    }

    /// Builder method to reject the swap step
    pub fn failing_swap(self, error: ProviderError) -> Self {
        self.with_failure(SWAP_SELECTOR, error)
    }

    /// Builder method to set a token balance returned by `balanceOf`
    pub fn with_balance(self, token: Address, amount: U256) -> Self {
        self.balances.lock().unwrap().insert(token, amount);
        self
    }

    /// Builder method to hold every transaction for `delay` before answering
    pub fn with_send_delay(mut self, delay: Duration) -> Self {
        self.send_delay = Some(delay);
        self
    }

    /// Push a notification to subscribers
    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// Get all transactions sent for signing, in order
    pub fn sent_transactions(&self) -> Vec<TxRequest> {
        self.sent.lock().unwrap().clone()
    }

    /// Transactions sent to a specific contract
    pub fn calls_to(&self, contract: Address) -> Vec<TxRequest> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|tx| tx.to == contract)
            .cloned()
            .collect()
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Accept requests again after `close`, as a fresh handshake would
    pub fn reopen(&self) {
        self.closed.store(false, Ordering::SeqCst);
    }

    fn ensure_open(&self) -> Result<(), ProviderError> {
        if self.is_closed() {
            Err(ProviderError::Closed)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    fn kind(&self) -> ProviderKind {
        self.kind
    }

    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.ensure_open()?;
        Ok(self.accounts.lock().unwrap().clone())
    }

    async fn chain_id(&self) -> Result<Value, ProviderError> {
        self.ensure_open()?;
        Ok(self.chain_id.lock().unwrap().clone())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ProviderError> {
        self.ensure_open()?;
        if data.get(..4) != Some(&BALANCE_OF_SELECTOR[..]) {
            return Err(ProviderError::Rpc {
                code: -32000,
                message: "execution reverted".to_string(),
            });
        }
        let balance = self
            .balances
            .lock()
            .unwrap()
            .get(&to)
            .copied()
            .unwrap_or(U256::ZERO);
        Ok(Bytes::from(balance.to_be_bytes::<32>().to_vec()))
    }

    async fn send_transaction(&self, tx: TxRequest) -> Result<TxReceipt, ProviderError> {
        self.ensure_open()?;
        self.sent.lock().unwrap().push(tx.clone());
        if let Some(delay) = self.send_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(selector) = tx.selector() {
            if let Some(error) = self.failures.lock().unwrap().get(&selector) {
                return Err(error.clone());
            }
        }

        let block = self.next_block.fetch_add(1, Ordering::SeqCst);
        Ok(TxReceipt {
            transaction_hash: B256::from(U256::from(block).to_be_bytes::<32>()),
            block_number: Some(block),
            success: true,
        })
    }

    async fn close(&self) -> Result<(), ProviderError> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Mock connector returning a fixed wallet, or failing when none is set
#[derive(Debug, Default)]
pub struct MockConnector {
    wallet: Option<Arc<MockWallet>>,
    error: Option<ProviderError>,
    connects: AtomicUsize,
}

impl MockConnector {
    pub fn new(wallet: Arc<MockWallet>) -> Self {
        Self {
            wallet: Some(wallet),
            ..Self::default()
        }
    }

    /// Connector whose `connect` always fails with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self {
            error: Some(error),
            ..Self::default()
        }
    }

    pub fn connect_count(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletConnector for MockConnector {
    async fn connect(&self) -> Result<Arc<dyn WalletProvider>, ProviderError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = &self.error {
            return Err(error.clone());
        }
        match &self.wallet {
            Some(wallet) => {
                wallet.reopen();
                Ok(wallet.clone() as Arc<dyn WalletProvider>)
            }
            None => Err(ProviderError::NoProvider),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::contracts;
    use alloy_primitives::address;

    const ACCOUNT: Address = address!("00000000000000000000000000000000000000a1");
    const TOKEN: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

    #[tokio::test]
    async fn test_mock_wallet_records_transactions() {
        let wallet = MockWallet::new(ACCOUNT, "0x89");
        let tx = contracts::approve(TOKEN, ACCOUNT, Address::ZERO, U256::from(1u64));

        let receipt = wallet.send_transaction(tx.clone()).await.unwrap();
        assert!(receipt.success);
        assert_eq!(wallet.sent_transactions(), vec![tx]);
        assert_eq!(wallet.calls_to(TOKEN).len(), 1);
    }

    #[tokio::test]
    async fn test_mock_wallet_configured_failure() {
        let wallet = MockWallet::new(ACCOUNT, 137u64)
            .failing_approval(ProviderError::UserRejected("denied".into()));
        let tx = contracts::approve(TOKEN, ACCOUNT, Address::ZERO, U256::from(1u64));

        let result = wallet.send_transaction(tx).await;
        assert_eq!(result, Err(ProviderError::UserRejected("denied".into())));
    }

    #[tokio::test]
    async fn test_mock_wallet_balance_and_close() {
        let wallet = MockWallet::new(ACCOUNT, 137u64).with_balance(TOKEN, U256::from(7u64));

        let balance = contracts::balance_of(&wallet, TOKEN, ACCOUNT).await.unwrap();
        assert_eq!(balance, U256::from(7u64));

        wallet.close().await.unwrap();
        assert!(wallet.is_closed());
        assert_eq!(wallet.request_accounts().await, Err(ProviderError::Closed));
    }

    #[tokio::test]
    async fn test_mock_connector() {
        let connector = MockConnector::failing(ProviderError::Cancelled);
        assert_eq!(connector.connect().await.err(), Some(ProviderError::Cancelled));
        assert_eq!(connector.connect_count(), 1);

        let empty = MockConnector::default();
        assert_eq!(empty.connect().await.err(), Some(ProviderError::NoProvider));
    }
}
