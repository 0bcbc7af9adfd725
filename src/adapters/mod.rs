//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - JSON-RPC: wallet endpoints speaking EIP-1193 methods over HTTP
//! - Modal: choosing between configured wallets
//! - CLI: Command-line interface handlers

pub mod cli;
pub mod jsonrpc;
pub mod modal;

pub use cli::CliApp;
pub use jsonrpc::{JsonRpcConfig, JsonRpcConnector, JsonRpcWallet};
pub use modal::{PreferredWallet, WalletChooser, WalletModal, WalletOption};
