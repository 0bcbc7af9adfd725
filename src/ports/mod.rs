//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these abstract:
//! - Wallet providers (connect, events, signing, close)
//! - Contract calls (ABI encoding for the token and router)

pub mod contracts;
pub mod mocks;
pub mod wallet;

pub use wallet::{
    ProviderError, ProviderEvent, ProviderKind, TxReceipt, TxRequest, WalletConnector, WalletProvider,
    USER_REJECTED_CODE,
};
