use thiserror::Error;

use crate::domain::{AmountError, FailureKind};
use crate::ports::ProviderError;

/// Errors surfaced by the connect and swap operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwapFlowError {
    #[error("Could not connect wallet: {0}")]
    Connection(ProviderError),
    #[error("No wallet connected. Connect your wallet first.")]
    NoSession,
    #[error("Invalid amount: {0}")]
    InvalidAmount(#[from] AmountError),
    #[error("Approval failed: {0}")]
    Approval(ProviderError),
    #[error("Swap failed: {0}")]
    Swap(ProviderError),
    #[error("Another operation is still in progress")]
    Busy,
    #[error("Balance query failed: {0}")]
    Query(ProviderError),
}

impl SwapFlowError {
    pub fn kind(&self) -> FailureKind {
        match self {
            SwapFlowError::Connection(_) => FailureKind::Connection,
            SwapFlowError::NoSession => FailureKind::NoSession,
            SwapFlowError::InvalidAmount(_) => FailureKind::InvalidAmount,
            SwapFlowError::Approval(_) => FailureKind::Approval,
            SwapFlowError::Swap(_) => FailureKind::Swap,
            SwapFlowError::Busy => FailureKind::Busy,
            SwapFlowError::Query(_) => FailureKind::Query,
        }
    }

    /// True when the wallet user declined the request
    pub fn is_user_rejection(&self) -> bool {
        matches!(
            self,
            SwapFlowError::Approval(ProviderError::UserRejected(_))
                | SwapFlowError::Swap(ProviderError::UserRejected(_))
                | SwapFlowError::Connection(ProviderError::Cancelled)
        )
    }
}
