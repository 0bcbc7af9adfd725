//! Application Layer - Use cases
//!
//! - `connection`: wallet session lifecycle and wallet notifications
//! - `orchestrator`: approve-then-swap purchase flow
//! - `app`: facade sharing one status reporter between the two

pub mod app;
pub mod connection;
pub mod error;
pub mod orchestrator;

pub use app::{Balances, SwapApp, TokenBalance};
pub use connection::ConnectionManager;
pub use error::SwapFlowError;
pub use orchestrator::{SwapOrchestrator, SwapOutcome};
