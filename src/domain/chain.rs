//! Chain identifiers
//!
//! Wallets report the active chain id in whatever shape their transport
//! produces: EIP-1193 providers emit `"0x89"`, bridged providers often emit the
//! plain number `137`, and some emit the decimal string `"137"`. Everything is
//! normalized to a `u64` before it reaches the session.

use serde_json::Value;
use thiserror::Error;

/// Polygon PoS mainnet
pub const POLYGON_MAINNET: u64 = 137;

/// Polygon Mumbai testnet (deprecated, still reported by older wallets)
pub const POLYGON_MUMBAI: u64 = 80001;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChainIdError {
    #[error("Empty chain id")]
    Empty,
    #[error("Invalid hex chain id: {0}")]
    InvalidHex(String),
    #[error("Invalid decimal chain id: {0}")]
    InvalidDecimal(String),
    #[error("Unsupported chain id value: {0}")]
    Unsupported(String),
}

/// Normalize a wallet-reported chain id to an integer.
pub fn normalize_chain_id(raw: &Value) -> Result<u64, ChainIdError> {
    match raw {
        Value::String(s) => parse_chain_id(s),
        Value::Number(n) => {
            if let Some(id) = n.as_u64() {
                return Ok(id);
            }
            // Some bridges serialize numbers as floats (137.0)
            match n.as_f64() {
                Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64 => Ok(f as u64),
                _ => Err(ChainIdError::Unsupported(n.to_string())),
            }
        }
        other => Err(ChainIdError::Unsupported(other.to_string())),
    }
}

/// Parse a chain id from its string form (`"0x89"` or `"137"`).
pub fn parse_chain_id(input: &str) -> Result<u64, ChainIdError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(ChainIdError::Empty);
    }

    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return u64::from_str_radix(hex, 16).map_err(|_| ChainIdError::InvalidHex(s.to_string()));
    }

    s.parse::<u64>()
        .map_err(|_| ChainIdError::InvalidDecimal(s.to_string()))
}

/// Hex quantity form used on the wire (`137` -> `"0x89"`).
pub fn to_hex_chain_id(chain_id: u64) -> String {
    format!("0x{:x}", chain_id)
}

/// Human-readable name for the chains this app knows about
pub fn chain_name(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("Ethereum"),
        POLYGON_MAINNET => Some("Polygon"),
        POLYGON_MUMBAI => Some("Polygon Mumbai"),
        80002 => Some("Polygon Amoy"),
        _ => None,
    }
}
