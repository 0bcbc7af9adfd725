//! Contract calls
//!
//! Minimal ABI surface of the two contracts the app talks to, and builders that
//! turn domain values into calldata for the wallet.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use super::wallet::{ProviderError, TxRequest, WalletProvider};
use crate::domain::SwapRequest;

sol! {
    interface IERC20 {
        function approve(address spender, uint256 value) external returns (bool);
        function balanceOf(address owner) external view returns (uint256 balance);
    }

    interface IUniswapV2Router02 {
        function swapExactTokensForTokens(
            uint256 amountIn,
            uint256 amountOutMin,
            address[] calldata path,
            address to,
            uint256 deadline
        ) external returns (uint256[] memory amounts);
    }
}

pub const APPROVE_SELECTOR: [u8; 4] = IERC20::approveCall::SELECTOR;
pub const BALANCE_OF_SELECTOR: [u8; 4] = IERC20::balanceOfCall::SELECTOR;
pub const SWAP_SELECTOR: [u8; 4] = IUniswapV2Router02::swapExactTokensForTokensCall::SELECTOR;

/// `token.approve(spender, amount)` sent from `owner`
pub fn approve(token: Address, owner: Address, spender: Address, amount: U256) -> TxRequest {
    let call = IERC20::approveCall {
        spender,
        value: amount,
    };
    TxRequest::new(owner, token, call.abi_encode())
}

/// `router.swapExactTokensForTokens(...)` sent from `from`
pub fn swap_exact_tokens_for_tokens(router: Address, from: Address, request: &SwapRequest) -> TxRequest {
    let call = IUniswapV2Router02::swapExactTokensForTokensCall {
        amountIn: request.amount_in,
        amountOutMin: request.amount_out_min,
        path: request.path.clone(),
        to: request.recipient,
        deadline: U256::from(request.deadline),
    };
    TxRequest::new(from, router, call.abi_encode())
}

pub fn balance_of_calldata(owner: Address) -> Bytes {
    IERC20::balanceOfCall { owner }.abi_encode().into()
}

pub fn decode_balance(data: &[u8]) -> Result<U256, ProviderError> {
    IERC20::balanceOfCall::abi_decode_returns(data, true)
        .map(|ret| ret.balance)
        .map_err(|e| ProviderError::InvalidResponse(format!("balanceOf: {}", e)))
}

/// Read `token.balanceOf(owner)` through the wallet
pub async fn balance_of(
    provider: &dyn WalletProvider,
    token: Address,
    owner: Address,
) -> Result<U256, ProviderError> {
    let output = provider.call(token, balance_of_calldata(owner)).await?;
    decode_balance(&output)
}
