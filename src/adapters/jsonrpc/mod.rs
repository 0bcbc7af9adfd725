//! JSON-RPC Wallet Adapter
//!
//! Wallet provider speaking EIP-1193 methods over HTTP JSON-RPC.

pub mod client;
pub mod types;

pub use client::{JsonRpcConfig, JsonRpcConnector, JsonRpcWallet};
pub use types::{RpcErrorObject, RpcReceipt};
