//! Status Reporter
//!
//! One current phase, overwritten on every transition. There is no history:
//! observers read the latest value or wait for the next change.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use super::chain::chain_name;

/// Which operation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Connection,
    NoSession,
    InvalidAmount,
    Approval,
    Swap,
    Busy,
    Query,
}

impl FailureKind {
    pub fn label(&self) -> &'static str {
        match self {
            FailureKind::Connection => "connection error",
            FailureKind::NoSession => "no wallet session",
            FailureKind::InvalidAmount => "invalid amount",
            FailureKind::Approval => "approval error",
            FailureKind::Swap => "swap error",
            FailureKind::Busy => "busy",
            FailureKind::Query => "query error",
        }
    }
}

/// Current user-facing phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum Phase {
    Idle,
    Connecting,
    Connected { chain_id: u64 },
    WrongNetwork { chain_id: u64, required: u64 },
    Disconnected,
    ApprovalPending,
    ApprovalConfirmed,
    SwapPending,
    SwapComplete,
    Failed { kind: FailureKind, message: String },
}

impl Phase {
    /// True while a transaction is waiting on the wallet
    pub fn is_pending(&self) -> bool {
        matches!(self, Phase::ApprovalPending | Phase::ApprovalConfirmed | Phase::SwapPending)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Phase::Failed { .. })
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "Ready. Connect a wallet to begin."),
            Phase::Connecting => write!(f, "Connecting wallet..."),
            Phase::Connected { chain_id } => match chain_name(*chain_id) {
                Some(name) => write!(f, "Connected on {} (chain {})", name, chain_id),
                None => write!(f, "Connected on chain {}", chain_id),
            },
            Phase::WrongNetwork { chain_id, required } => write!(
                f,
                "Wrong network (chain {}). Switch your wallet to {} (chain {}).",
                chain_id,
                chain_name(*required).unwrap_or("the required network"),
                required
            ),
            Phase::Disconnected => write!(f, "Disconnected"),
            Phase::ApprovalPending => write!(f, "Requesting token approval..."),
            Phase::ApprovalConfirmed => write!(f, "Approval confirmed. Executing swap..."),
            Phase::SwapPending => write!(f, "Waiting for swap confirmation..."),
            Phase::SwapComplete => write!(f, "Swap complete. Check your wallet."),
            Phase::Failed { kind, message } => write!(f, "Error ({}): {}", kind.label(), message),
        }
    }
}

/// Single-value status sink shared by the connection manager and orchestrator
#[derive(Debug, Clone)]
pub struct StatusReporter {
    tx: Arc<watch::Sender<Phase>>,
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Phase::Idle);
        Self { tx: Arc::new(tx) }
    }

    /// Overwrite the current phase
    pub fn set(&self, phase: Phase) {
        if phase.is_failure() {
            tracing::warn!("Status: {}", phase);
        } else {
            tracing::info!("Status: {}", phase);
        }
        self.tx.send_replace(phase);
    }

    pub fn current(&self) -> Phase {
        self.tx.borrow().clone()
    }

    /// Receiver that wakes on every overwrite
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}
