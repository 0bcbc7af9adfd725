//! Domain Layer - Core types for the swap front end
//!
//! Plain value types and rules with no I/O. The only outward reference is the
//! provider handle carried by `WalletSession`.
//!
//! - `amount`: decimal input -> smallest-unit conversion
//! - `chain`: chain id normalization
//! - `session`: wallet session and connection state
//! - `swap_request`: route and per-submission swap arguments
//! - `status`: single-value phase reporter

pub mod amount;
pub mod chain;
pub mod session;
pub mod status;
pub mod swap_request;

pub use amount::{format_units, parse_amount, parse_base_units, to_base_units, AmountError};
pub use chain::{chain_name, normalize_chain_id, parse_chain_id, ChainIdError, POLYGON_MAINNET, POLYGON_MUMBAI};
pub use session::{ConnectionState, WalletSession};
pub use status::{FailureKind, Phase, StatusReporter};
pub use swap_request::{SwapRequest, SwapRoute, TokenInfo, ACCEPT_ANY_OUTPUT, DEFAULT_DEADLINE_SECS};
