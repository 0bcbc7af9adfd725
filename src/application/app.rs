//! Swap application
//!
//! Ties the connection manager and orchestrator to one status reporter. This
//! is what the console and the one-shot commands drive.

use std::fmt;
use std::sync::Arc;

use alloy_primitives::U256;
use tokio::sync::watch;

use super::connection::ConnectionManager;
use super::error::SwapFlowError;
use super::orchestrator::{SwapOrchestrator, SwapOutcome};
use crate::config::Config;
use crate::domain::{format_units, Phase, StatusReporter, SwapRoute, TokenInfo, WalletSession};
use crate::ports::{contracts, WalletConnector};

/// Balance of one token, rendered with its symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub symbol: String,
    pub decimals: u32,
    pub amount: U256,
}

impl fmt::Display for TokenBalance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", format_units(self.amount, self.decimals), self.symbol)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balances {
    pub source: TokenBalance,
    pub destination: TokenBalance,
}

#[derive(Clone)]
pub struct SwapApp {
    connection: ConnectionManager,
    orchestrator: SwapOrchestrator,
    status: StatusReporter,
}

impl SwapApp {
    pub fn new(connector: Arc<dyn WalletConnector>, route: SwapRoute) -> Self {
        let status = StatusReporter::new();
        Self {
            connection: ConnectionManager::new(connector, route.chain_id, status.clone()),
            orchestrator: SwapOrchestrator::new(route, status.clone()),
            status,
        }
    }

    pub fn from_config(config: &Config, connector: Arc<dyn WalletConnector>) -> Self {
        Self::new(connector, SwapRoute::from(config))
    }

    pub async fn connect(&self) -> Result<WalletSession, SwapFlowError> {
        self.connection.connect().await
    }

    pub async fn disconnect(&self) {
        self.connection.disconnect().await
    }

    /// Purchase the destination token with `amount` of the source token
    pub async fn buy(&self, amount: &str) -> Result<SwapOutcome, SwapFlowError> {
        let session = self.connection.session().await;
        self.orchestrator.submit_swap(session.as_ref(), amount).await
    }

    /// Read both route balances for the connected account
    pub async fn balances(&self) -> Result<Balances, SwapFlowError> {
        let session = self.connection.session().await.ok_or(SwapFlowError::NoSession)?;
        let route = self.orchestrator.route();

        let source = Self::balance(&session, &route.source).await?;
        let destination = Self::balance(&session, &route.destination).await?;

        Ok(Balances { source, destination })
    }

    async fn balance(session: &WalletSession, token: &TokenInfo) -> Result<TokenBalance, SwapFlowError> {
        let amount = contracts::balance_of(session.provider().as_ref(), token.address, session.account())
            .await
            .map_err(|e| {
                tracing::warn!(token = %token.symbol, "Balance query failed: {}", e);
                SwapFlowError::Query(e)
            })?;

        Ok(TokenBalance {
            symbol: token.symbol.clone(),
            decimals: token.decimals,
            amount,
        })
    }

    pub async fn session(&self) -> Option<WalletSession> {
        self.connection.session().await
    }

    pub fn status(&self) -> Phase {
        self.status.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.status.subscribe()
    }

    pub fn route(&self) -> &SwapRoute {
        self.orchestrator.route()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn is_busy(&self) -> bool {
        self.orchestrator.is_busy()
    }
}
