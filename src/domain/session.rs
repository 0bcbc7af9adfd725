//! Wallet Session
//!
//! The live link to a connected wallet: provider handle, active account and
//! active chain. Only the connection manager mutates it; everything else works
//! on cloned snapshots.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

use crate::ports::WalletProvider;

/// Active wallet session
#[derive(Clone)]
pub struct WalletSession {
    provider: Arc<dyn WalletProvider>,
    account: Address,
    chain_id: u64,
}

impl WalletSession {
    pub fn new(provider: Arc<dyn WalletProvider>, account: Address, chain_id: u64) -> Self {
        Self {
            provider,
            account,
            chain_id,
        }
    }

    /// Provider used to sign and submit transactions
    pub fn provider(&self) -> &Arc<dyn WalletProvider> {
        &self.provider
    }

    /// Currently selected account
    pub fn account(&self) -> Address {
        self.account
    }

    /// Chain the wallet last reported
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Whether the wallet is on the given chain
    pub fn is_on(&self, chain_id: u64) -> bool {
        self.chain_id == chain_id
    }

    pub(crate) fn set_account(&mut self, account: Address) {
        self.account = account;
    }

    pub(crate) fn set_chain_id(&mut self, chain_id: u64) {
        self.chain_id = chain_id;
    }
}

impl fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSession")
            .field("provider", &self.provider.kind())
            .field("account", &self.account)
            .field("chain_id", &self.chain_id)
            .finish()
    }
}

/// Connection lifecycle
///
/// `Disconnected -> Connecting -> Connected -> Disconnected`, with
/// `WrongNetwork` as a sub-state of connected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { chain_id: u64 },
    WrongNetwork { chain_id: u64, required: u64 },
}

impl ConnectionState {
    /// State for a session on `chain_id` when `required` is expected
    pub fn for_chain(chain_id: u64, required: u64) -> Self {
        if chain_id == required {
            ConnectionState::Connected { chain_id }
        } else {
            ConnectionState::WrongNetwork { chain_id, required }
        }
    }

    /// True for both `Connected` and `WrongNetwork`
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            ConnectionState::Connected { .. } | ConnectionState::WrongNetwork { .. }
        )
    }
}

impl Default for ConnectionState {
    fn default() -> Self {
        ConnectionState::Disconnected
    }
}
