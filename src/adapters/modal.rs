//! Wallet Selection
//!
//! `WalletModal` is the connector the connection manager sees. It lists the
//! configured wallets, lets a `WalletChooser` pick one, and delegates to that
//! wallet's connector.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use super::jsonrpc::JsonRpcConnector;
use crate::config::Config;
use crate::ports::{ProviderError, ProviderKind, WalletConnector, WalletProvider};

/// Entry shown to the chooser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletOption {
    pub name: String,
    pub kind: ProviderKind,
}

/// Picks one of the offered wallets, or `None` to cancel
pub trait WalletChooser: Send + Sync {
    fn choose(&self, options: &[WalletOption]) -> Option<usize>;
}

/// Chooser driven by a wallet name set ahead of time.
///
/// With no name set the first wallet is used.
#[derive(Debug, Default)]
pub struct PreferredWallet {
    name: RwLock<Option<String>>,
}

impl PreferredWallet {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: RwLock::new(name),
        }
    }

    pub fn set(&self, name: Option<String>) {
        match self.name.write() {
            Ok(mut guard) => *guard = name,
            Err(poisoned) => *poisoned.into_inner() = name,
        }
    }

    pub fn get(&self) -> Option<String> {
        match self.name.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl WalletChooser for PreferredWallet {
    fn choose(&self, options: &[WalletOption]) -> Option<usize> {
        match self.get() {
            Some(name) => options.iter().position(|o| o.name.eq_ignore_ascii_case(&name)),
            None if options.is_empty() => None,
            None => Some(0),
        }
    }
}

/// Selects among configured wallets
pub struct WalletModal {
    entries: Vec<(WalletOption, Arc<dyn WalletConnector>)>,
    chooser: Arc<dyn WalletChooser>,
}

impl WalletModal {
    pub fn new(chooser: Arc<dyn WalletChooser>) -> Self {
        Self {
            entries: Vec::new(),
            chooser,
        }
    }

    /// Modal offering every wallet in the config
    pub fn from_config(config: &Config, chooser: Arc<dyn WalletChooser>) -> Self {
        config.wallets.iter().fold(Self::new(chooser), |modal, wallet| {
            let connector = JsonRpcConnector::new(config.json_rpc_config(wallet));
            modal.with_wallet(&wallet.name, wallet.kind, Arc::new(connector))
        })
    }

    pub fn with_wallet(mut self, name: &str, kind: ProviderKind, connector: Arc<dyn WalletConnector>) -> Self {
        let option = WalletOption {
            name: name.to_string(),
            kind,
        };
        self.entries.push((option, connector));
        self
    }

    pub fn options(&self) -> Vec<WalletOption> {
        self.entries.iter().map(|(option, _)| option.clone()).collect()
    }
}

#[async_trait]
impl WalletConnector for WalletModal {
    async fn connect(&self) -> Result<Arc<dyn WalletProvider>, ProviderError> {
        if self.entries.is_empty() {
            return Err(ProviderError::NoProvider);
        }

        let options = self.options();
        let index = self.chooser.choose(&options).ok_or(ProviderError::Cancelled)?;
        let (option, connector) = self.entries.get(index).ok_or(ProviderError::Cancelled)?;

        tracing::info!(wallet = %option.name, kind = %option.kind, "Wallet selected");
        connector.connect().await
    }
}
