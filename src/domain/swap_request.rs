//! Swap Requests
//!
//! A swap request is built per submission from the active session and the
//! configured route, then thrown away once the router call resolves.

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

use super::session::WalletSession;

/// Default window between submission and the on-chain deadline
pub const DEFAULT_DEADLINE_SECS: u64 = 120;

/// Minimum output accepted by the router.
///
/// Zero means any output is accepted (no slippage protection). Changing this
/// changes the economics of every swap and needs a product decision first.
pub const ACCEPT_ANY_OUTPUT: U256 = U256::ZERO;

/// ERC-20 token taking part in the swap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub symbol: String,
    pub address: Address,
    pub decimals: u32,
}

/// Fixed route: source token -> destination token through one router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRoute {
    /// Chain the contracts live on
    pub chain_id: u64,
    pub source: TokenInfo,
    pub destination: TokenInfo,
    /// Router contract that pulls the approved source tokens
    pub router: Address,
    pub deadline_secs: u64,
}

impl SwapRoute {
    /// Two-hop path handed to the router
    pub fn path(&self) -> Vec<Address> {
        vec![self.source.address, self.destination.address]
    }

    /// Pair label for logs ("USDT/ENOC")
    pub fn pair_symbol(&self) -> String {
        format!("{}/{}", self.source.symbol, self.destination.symbol)
    }
}

/// Arguments of one `swapExactTokensForTokens` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub amount_in: U256,
    pub amount_out_min: U256,
    pub path: Vec<Address>,
    pub recipient: Address,
    /// Unix timestamp (seconds) after which the router rejects the swap
    pub deadline: u64,
}

impl SwapRequest {
    /// Build a request for the session's account.
    ///
    /// Taking the session by reference means a request cannot exist without
    /// one.
    pub fn new(session: &WalletSession, route: &SwapRoute, amount_in: U256, now_unix: u64) -> Self {
        Self {
            amount_in,
            amount_out_min: ACCEPT_ANY_OUTPUT,
            path: route.path(),
            recipient: session.account(),
            deadline: now_unix.saturating_add(route.deadline_secs),
        }
    }

    /// True when the router will accept any output amount
    pub fn accepts_any_output(&self) -> bool {
        self.amount_out_min == ACCEPT_ANY_OUTPUT
    }
}
