//! Swap Orchestrator
//!
//! Runs one purchase: validate input, approve the router to pull the source
//! token, then swap along the configured route. Only one purchase runs at a
//! time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;

use super::error::SwapFlowError;
use crate::domain::{parse_amount, to_base_units, Phase, StatusReporter, SwapRequest, SwapRoute, WalletSession};
use crate::ports::{contracts, TxReceipt};

/// Receipts and arguments of a completed purchase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapOutcome {
    pub request: SwapRequest,
    pub approval: TxReceipt,
    pub swap: TxReceipt,
}

/// Holds the in-flight flag until dropped
struct BusyGuard(Arc<AtomicBool>);

impl BusyGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Approve-then-swap coordinator
#[derive(Clone)]
pub struct SwapOrchestrator {
    route: SwapRoute,
    status: StatusReporter,
    busy: Arc<AtomicBool>,
}

impl SwapOrchestrator {
    pub fn new(route: SwapRoute, status: StatusReporter) -> Self {
        Self {
            route,
            status,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn route(&self) -> &SwapRoute {
        &self.route
    }

    /// True while a purchase is between submission and its final phase
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Buy the destination token with `amount` of the source token.
    ///
    /// The swap is only attempted after the approval confirms. A second call
    /// while one is in flight returns `Busy` and leaves the status alone.
    pub async fn submit_swap(
        &self,
        session: Option<&WalletSession>,
        amount: &str,
    ) -> Result<SwapOutcome, SwapFlowError> {
        let _guard = match BusyGuard::acquire(&self.busy) {
            Some(guard) => guard,
            None => {
                tracing::warn!("Purchase rejected: another purchase is in progress");
                return Err(SwapFlowError::Busy);
            }
        };

        let result = self.execute(session, amount).await;
        if let Err(e) = &result {
            if e.is_user_rejection() {
                tracing::info!("Purchase cancelled in wallet: {}", e);
            } else {
                tracing::error!("Purchase failed: {}", e);
            }
            self.status.set(Phase::Failed {
                kind: e.kind(),
                message: e.to_string(),
            });
        }
        result
    }

    async fn execute(
        &self,
        session: Option<&WalletSession>,
        amount: &str,
    ) -> Result<SwapOutcome, SwapFlowError> {
        let session = session.ok_or(SwapFlowError::NoSession)?;
        let amount = parse_amount(amount)?;
        let amount_in = to_base_units(amount, self.route.source.decimals)?;

        if !session.is_on(self.route.chain_id) {
            tracing::warn!(
                chain_id = session.chain_id(),
                required = self.route.chain_id,
                "Submitting purchase while the wallet is on another network"
            );
        }

        // Both steps run from this account; it is the one holding the allowance
        let account = session.account();
        let provider = session.provider();

        tracing::info!(
            %account,
            %amount,
            pair = %self.route.pair_symbol(),
            "Submitting purchase"
        );

        // 1. Allow the router to pull exactly amount_in
        self.status.set(Phase::ApprovalPending);
        let approve = contracts::approve(self.route.source.address, account, self.route.router, amount_in);
        let approval = provider
            .send_transaction(approve)
            .await
            .map_err(SwapFlowError::Approval)?;
        tracing::info!(tx = %approval.transaction_hash, "Approval confirmed");
        self.status.set(Phase::ApprovalConfirmed);

        // 2. Swap; the deadline window starts once the approval is mined
        let request = SwapRequest::new(session, &self.route, amount_in, unix_now());
        if request.accepts_any_output() {
            tracing::warn!("Swap accepts any output amount (amountOutMin = 0), no slippage protection");
        }

        self.status.set(Phase::SwapPending);
        let swap_tx = contracts::swap_exact_tokens_for_tokens(self.route.router, account, &request);
        let swap = provider
            .send_transaction(swap_tx)
            .await
            .map_err(SwapFlowError::Swap)?;
        tracing::info!(tx = %swap.transaction_hash, deadline = request.deadline, "Swap confirmed");
        self.status.set(Phase::SwapComplete);

        Ok(SwapOutcome {
            request,
            approval,
            swap,
        })
    }
}

fn unix_now() -> u64 {
    u64::try_from(Utc::now().timestamp()).unwrap_or(0)
}
