//! Configuration Module
//!
//! Loads and validates configuration from TOML files.

pub mod loader;

pub use loader::{
    Config, ConfigError, load_config, load_config_or_default, WalletSection,
    ENOC_ADDRESS, USDT_ADDRESS, QUICKSWAP_ROUTER,
};
