//! Connection Manager
//!
//! Owns the wallet session. Connect and disconnect come from the user; account,
//! chain and disconnect notifications come from the wallet through a listener
//! task. Every transition is mirrored to the status reporter.

use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

use super::error::SwapFlowError;
use crate::domain::{normalize_chain_id, ConnectionState, Phase, StatusReporter, WalletSession};
use crate::ports::{ProviderError, ProviderEvent, WalletConnector, WalletProvider};

#[derive(Default)]
struct Inner {
    state: ConnectionState,
    session: Option<WalletSession>,
    /// Bumped on every connect/teardown so stale listeners and late connects
    /// can tell they no longer own the session
    generation: u64,
    listener: Option<JoinHandle<()>>,
}

/// Wallet session lifecycle
#[derive(Clone)]
pub struct ConnectionManager {
    connector: Arc<dyn WalletConnector>,
    required_chain_id: u64,
    status: StatusReporter,
    inner: Arc<RwLock<Inner>>,
}

impl ConnectionManager {
    pub fn new(connector: Arc<dyn WalletConnector>, required_chain_id: u64, status: StatusReporter) -> Self {
        Self {
            connector,
            required_chain_id,
            status,
            inner: Arc::new(RwLock::new(Inner::default())),
        }
    }

    /// Ask the user for a wallet and open a session on it.
    ///
    /// An existing session is released first. Nothing is retried: on failure
    /// the manager is left disconnected and the user must connect again.
    pub async fn connect(&self) -> Result<WalletSession, SwapFlowError> {
        let (generation, previous) = {
            let mut inner = self.inner.write().await;
            if inner.state == ConnectionState::Connecting {
                return Err(SwapFlowError::Busy);
            }
            let previous = Self::detach(&mut inner, true);
            inner.generation += 1;
            inner.state = ConnectionState::Connecting;
            self.status.set(Phase::Connecting);
            (inner.generation, previous)
        };

        if let Some(session) = previous {
            tracing::info!(account = %session.account(), "Releasing previous wallet session");
            Self::release(session).await;
        }

        let opened = self.open_session().await;

        let mut inner = self.inner.write().await;
        if inner.generation != generation {
            // disconnect() ran while the wallet prompt was open
            drop(inner);
            if let Ok((session, _)) = opened {
                Self::release(session).await;
            }
            return Err(SwapFlowError::Connection(ProviderError::Closed));
        }

        match opened {
            Ok((session, events)) => {
                let chain_id = session.chain_id();
                let state = ConnectionState::for_chain(chain_id, self.required_chain_id);

                inner.state = state;
                inner.session = Some(session.clone());
                inner.listener = Some(self.spawn_listener(events, generation));

                tracing::info!(
                    account = %session.account(),
                    chain_id,
                    kind = %session.provider().kind(),
                    "Wallet connected"
                );
                self.status.set(Phase::Connected { chain_id });
                self.report_network(state);

                Ok(session)
            }
            Err(e) => {
                inner.state = ConnectionState::Disconnected;
                let err = SwapFlowError::Connection(e);
                tracing::error!("Wallet connection failed: {}", err);
                self.status.set(Phase::Failed {
                    kind: err.kind(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Release the session if there is one. Safe to call repeatedly.
    pub async fn disconnect(&self) {
        let session = {
            let mut inner = self.inner.write().await;
            inner.generation += 1;
            let session = Self::detach(&mut inner, true);
            self.status.set(Phase::Disconnected);
            session
        };

        if let Some(session) = session {
            tracing::info!(account = %session.account(), "Wallet disconnected");
            Self::release(session).await;
        }
    }

    /// Snapshot of the active session
    pub async fn session(&self) -> Option<WalletSession> {
        self.inner.read().await.session.clone()
    }

    pub async fn state(&self) -> ConnectionState {
        self.inner.read().await.state
    }

    pub async fn account(&self) -> Option<Address> {
        self.inner.read().await.session.as_ref().map(|s| s.account())
    }

    pub fn required_chain_id(&self) -> u64 {
        self.required_chain_id
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    async fn open_session(
        &self,
    ) -> Result<(WalletSession, broadcast::Receiver<ProviderEvent>), ProviderError> {
        let provider = self.connector.connect().await?;
        // Subscribe before querying so nothing emitted in between is lost
        let events = provider.subscribe();

        match Self::identify(provider.as_ref()).await {
            Ok((account, chain_id)) => Ok((WalletSession::new(provider, account, chain_id), events)),
            Err(e) => {
                if let Err(close_err) = provider.close().await {
                    tracing::debug!("Ignoring close error after failed connect: {}", close_err);
                }
                Err(e)
            }
        }
    }

    async fn identify(provider: &dyn WalletProvider) -> Result<(Address, u64), ProviderError> {
        let accounts = provider.request_accounts().await?;
        let account = *accounts
            .first()
            .ok_or_else(|| ProviderError::InvalidResponse("wallet returned no accounts".to_string()))?;

        let raw = provider.chain_id().await?;
        let chain_id = normalize_chain_id(&raw)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        Ok((account, chain_id))
    }

    /// Clear session state. The listener is aborted unless the caller is the
    /// listener itself.
    fn detach(inner: &mut Inner, abort_listener: bool) -> Option<WalletSession> {
        if let Some(handle) = inner.listener.take() {
            if abort_listener {
                handle.abort();
            }
        }
        inner.state = ConnectionState::Disconnected;
        inner.session.take()
    }

    async fn release(session: WalletSession) {
        if let Err(e) = session.provider().close().await {
            tracing::debug!("Ignoring error while closing wallet: {}", e);
        }
    }

    fn report_network(&self, state: ConnectionState) {
        if let ConnectionState::WrongNetwork { chain_id, required } = state {
            tracing::warn!(chain_id, required, "Wallet is on the wrong network");
            self.status.set(Phase::WrongNetwork { chain_id, required });
        }
    }

    fn spawn_listener(
        &self,
        mut events: broadcast::Receiver<ProviderEvent>,
        generation: u64,
    ) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if !manager.handle_event(generation, event).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Wallet event listener lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Wallet event stream closed");
                        break;
                    }
                }
            }
        })
    }

    /// Apply one wallet notification. Returns false once the listener should
    /// stop.
    async fn handle_event(&self, generation: u64, event: ProviderEvent) -> bool {
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let mut inner = self.inner.write().await;
                if inner.generation != generation {
                    return false;
                }

                match accounts.first() {
                    Some(&account) => {
                        if let Some(session) = inner.session.as_mut() {
                            session.set_account(account);
                        }
                        tracing::info!(%account, "Wallet account changed");
                        true
                    }
                    None => {
                        drop(inner);
                        tracing::warn!("Wallet reported no accounts, ending session");
                        self.teardown(generation).await;
                        false
                    }
                }
            }
            ProviderEvent::ChainChanged(raw) => {
                let chain_id = match normalize_chain_id(&raw) {
                    Ok(id) => id,
                    Err(e) => {
                        tracing::warn!("Ignoring chain change with unreadable id {}: {}", raw, e);
                        return true;
                    }
                };

                let mut inner = self.inner.write().await;
                if inner.generation != generation {
                    return false;
                }

                if let Some(session) = inner.session.as_mut() {
                    session.set_chain_id(chain_id);
                }
                let state = ConnectionState::for_chain(chain_id, self.required_chain_id);
                inner.state = state;

                tracing::info!(chain_id, "Wallet network changed");
                match state {
                    ConnectionState::Connected { chain_id } => self.status.set(Phase::Connected { chain_id }),
                    other => self.report_network(other),
                }
                true
            }
            ProviderEvent::Disconnected { code, reason } => {
                tracing::info!(?code, "Wallet ended the session: {}", reason);
                self.teardown(generation).await;
                false
            }
        }
    }

    /// Disconnect initiated by the wallet, run from the listener task
    async fn teardown(&self, generation: u64) {
        let session = {
            let mut inner = self.inner.write().await;
            if inner.generation != generation {
                return;
            }
            inner.generation += 1;
            let session = Self::detach(&mut inner, false);
            self.status.set(Phase::Disconnected);
            session
        };

        if let Some(session) = session {
            Self::release(session).await;
        }
    }
}
