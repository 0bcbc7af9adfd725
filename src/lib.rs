//! ENOC Swap - Buy ENOC with USDT on Polygon
//!
//! Connects to an external wallet, approves the QuickSwap router to spend the
//! source token and swaps it for ENOC. The wallet signs everything.
//!
//! # Modules
//!
//! - `domain`: Core types (amounts, chain ids, session, swap request, status)
//! - `ports`: Trait abstractions (WalletProvider, WalletConnector, contract calls)
//! - `adapters`: External implementations (JSON-RPC wallet, wallet modal, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Connection manager, swap orchestrator and app facade

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
