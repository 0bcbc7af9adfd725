//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every section has a
//! built-in default pointing at Polygon mainnet, so the app runs without a
//! config file.

use std::path::Path;
use std::time::Duration;

use alloy_primitives::{address, Address};
use serde::Deserialize;
use thiserror::Error;

use crate::adapters::jsonrpc::JsonRpcConfig;
use crate::domain::amount::MAX_DECIMALS;
use crate::domain::{SwapRoute, TokenInfo, DEFAULT_DEADLINE_SECS, POLYGON_MAINNET};
use crate::ports::ProviderKind;

/// ENOC token on Polygon
pub const ENOC_ADDRESS: Address = address!("ab8DF9213d13a3cDe984A83129e6acDaCBA78633");

/// Bridged USDT on Polygon (6 decimals)
pub const USDT_ADDRESS: Address = address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174");

/// QuickSwap V2 router on Polygon
pub const QUICKSWAP_ROUTER: Address = address!("a5E0829CaCEd8fFDD4De3c43696c57F7D7A678ff");

pub const POLYGON_RPC_URL: &str = "https://polygon-rpc.com";

/// Default local wallet endpoint (Frame desktop wallet)
pub const DEFAULT_INJECTED_URL: &str = "http://127.0.0.1:1248";

/// Environment variable overriding `network.rpc_url`
pub const RPC_URL_ENV: &str = "ENOC_RPC_URL";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub network: NetworkSection,
    #[serde(default)]
    pub tokens: TokensSection,
    #[serde(default)]
    pub router: RouterSection,
    #[serde(default = "default_wallets")]
    pub wallets: Vec<WalletSection>,
    #[serde(default)]
    pub receipts: ReceiptSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Network the contracts live on
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSection {
    /// Display name
    pub name: String,
    /// Chain id the wallet must be on
    pub chain_id: u64,
    /// Public RPC used for reads when the wallet is remote
    pub rpc_url: String,
}

impl NetworkSection {
    /// Get RPC URL with environment variable override
    /// Checks ENOC_RPC_URL env var first, falls back to config value
    pub fn get_rpc_url(&self) -> String {
        std::env::var(RPC_URL_ENV).unwrap_or_else(|_| self.rpc_url.clone())
    }
}

impl Default for NetworkSection {
    fn default() -> Self {
        Self {
            name: "Polygon".to_string(),
            chain_id: POLYGON_MAINNET,
            rpc_url: POLYGON_RPC_URL.to_string(),
        }
    }
}

/// Token pair
#[derive(Debug, Clone, Deserialize)]
pub struct TokensSection {
    /// Token spent (approved to the router)
    pub source: TokenSection,
    /// Token received
    pub destination: TokenSection,
}

impl Default for TokensSection {
    fn default() -> Self {
        Self {
            source: TokenSection {
                symbol: "USDT".to_string(),
                address: USDT_ADDRESS,
                decimals: 6,
            },
            destination: TokenSection {
                symbol: "ENOC".to_string(),
                address: ENOC_ADDRESS,
                decimals: 18,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenSection {
    pub symbol: String,
    pub address: Address,
    pub decimals: u32,
}

/// Router contract
#[derive(Debug, Clone, Deserialize)]
pub struct RouterSection {
    pub address: Address,
    /// Seconds between submission and the swap deadline
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
}

impl Default for RouterSection {
    fn default() -> Self {
        Self {
            address: QUICKSWAP_ROUTER,
            deadline_secs: DEFAULT_DEADLINE_SECS,
        }
    }
}

/// One selectable wallet
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct WalletSection {
    pub name: String,
    pub kind: ProviderKind,
    /// JSON-RPC endpoint of the wallet or bridge
    pub url: String,
}

/// Receipt and wallet polling
#[derive(Debug, Clone, Deserialize)]
pub struct ReceiptSection {
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_receipt_timeout_secs")]
    pub timeout_secs: u64,
    /// How often account/chain changes are checked
    #[serde(default = "default_watch_interval_ms")]
    pub watch_interval_ms: u64,
}

impl Default for ReceiptSection {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval_ms(),
            timeout_secs: default_receipt_timeout_secs(),
            watch_interval_ms: default_watch_interval_ms(),
        }
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

fn default_wallets() -> Vec<WalletSection> {
    vec![WalletSection {
        name: "frame".to_string(),
        kind: ProviderKind::Injected,
        url: DEFAULT_INJECTED_URL.to_string(),
    }]
}

fn default_deadline_secs() -> u64 {
    DEFAULT_DEADLINE_SECS
}

fn default_poll_interval_ms() -> u64 {
    1_000
}

fn default_receipt_timeout_secs() -> u64 {
    750
}

fn default_watch_interval_ms() -> u64 {
    2_000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkSection::default(),
            tokens: TokensSection::default(),
            router: RouterSection::default(),
            wallets: default_wallets(),
            receipts: ReceiptSection::default(),
            logging: LoggingSection::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file (`~` is expanded)
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = shellexpand::tilde(&path.as_ref().to_string_lossy()).to_string();
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Load from `path` when given, otherwise use the built-in defaults
pub fn load_config_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => load_config(p),
        None => Ok(Config::default()),
    }
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.network.chain_id == 0 {
            return Err(ConfigError::ValidationError(
                "network.chain_id must be > 0".to_string(),
            ));
        }

        if self.network.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "network.rpc_url cannot be empty".to_string(),
            ));
        }

        let source = &self.tokens.source;
        let destination = &self.tokens.destination;

        if source.decimals > MAX_DECIMALS {
            return Err(ConfigError::ValidationError(format!(
                "tokens.source.decimals must be <= {}, got {}",
                MAX_DECIMALS, source.decimals
            )));
        }

        if source.address == destination.address {
            return Err(ConfigError::ValidationError(format!(
                "source and destination token are the same ({})",
                source.address
            )));
        }

        if source.address == Address::ZERO || destination.address == Address::ZERO {
            return Err(ConfigError::ValidationError(
                "token addresses cannot be zero".to_string(),
            ));
        }

        if self.router.address == Address::ZERO {
            return Err(ConfigError::ValidationError(
                "router.address cannot be zero".to_string(),
            ));
        }

        if self.router.deadline_secs == 0 {
            return Err(ConfigError::ValidationError(
                "router.deadline_secs must be > 0".to_string(),
            ));
        }

        for (i, wallet) in self.wallets.iter().enumerate() {
            if wallet.name.is_empty() || wallet.url.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "wallets[{}] needs both name and url",
                    i
                )));
            }
            if self.wallets[..i].iter().any(|w| w.name == wallet.name) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate wallet name '{}'",
                    wallet.name
                )));
            }
        }

        if self.receipts.poll_interval_ms == 0 || self.receipts.watch_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "receipt and watch intervals must be > 0".to_string(),
            ));
        }

        Ok(())
    }

    /// JSON-RPC adapter settings for one configured wallet.
    ///
    /// Remote wallets read chain state from the public RPC; injected wallets
    /// answer reads themselves.
    pub fn json_rpc_config(&self, wallet: &WalletSection) -> JsonRpcConfig {
        let read_url = match wallet.kind {
            ProviderKind::Remote => Some(self.network.get_rpc_url()),
            ProviderKind::Injected => None,
        };

        JsonRpcConfig {
            url: wallet.url.clone(),
            kind: wallet.kind,
            read_url,
            receipt_poll_interval: Duration::from_millis(self.receipts.poll_interval_ms),
            receipt_timeout: Duration::from_secs(self.receipts.timeout_secs),
            watch_interval: Duration::from_millis(self.receipts.watch_interval_ms),
            ..JsonRpcConfig::default()
        }
    }
}

impl From<&TokenSection> for TokenInfo {
    fn from(token: &TokenSection) -> Self {
        TokenInfo {
            symbol: token.symbol.clone(),
            address: token.address,
            decimals: token.decimals,
        }
    }
}

// Conversion from Config to the swap route
impl From<&Config> for SwapRoute {
    fn from(config: &Config) -> Self {
        SwapRoute {
            chain_id: config.network.chain_id,
            source: TokenInfo::from(&config.tokens.source),
            destination: TokenInfo::from(&config.tokens.destination),
            router: config.router.address,
            deadline_secs: config.router.deadline_secs,
        }
    }
}
