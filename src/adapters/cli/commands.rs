//! CLI Command Handlers
//!
//! Implementation of all CLI commands for the ENOC swap client.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use super::console;
use crate::adapters::modal::{PreferredWallet, WalletModal};
use crate::application::SwapApp;
use crate::config::{load_config_or_default, Config};
use crate::domain::format_units;

/// enoc-swap - Buy ENOC with USDT on Polygon through QuickSwap
#[derive(Parser, Debug)]
#[command(
    name = "enoc-swap",
    version = env!("CARGO_PKG_VERSION"),
    about = "Buy ENOC with USDT on Polygon through QuickSwap",
    long_about = "enoc-swap connects to an external wallet, approves the QuickSwap router to \
                  spend USDT and swaps it for ENOC. Signing happens in the wallet."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to configuration file (built-in Polygon defaults when omitted)
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive console: connect, buy, disconnect
    Run(RunCmd),

    /// Connect, buy once, disconnect
    Buy(BuyCmd),

    /// Show source and destination token balances
    Balance(BalanceCmd),
}

/// Start the console
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Wallet to use for `connect` without an argument
    #[arg(short, long, value_name = "NAME")]
    pub wallet: Option<String>,
}

/// One-shot purchase
#[derive(Parser, Debug)]
pub struct BuyCmd {
    /// Amount of the source token to spend (e.g. 10 or 2.5)
    #[arg(value_name = "AMOUNT", allow_negative_numbers = true)]
    pub amount: String,

    /// Wallet name from the config
    #[arg(short, long, value_name = "NAME")]
    pub wallet: Option<String>,
}

/// Balance query
#[derive(Parser, Debug)]
pub struct BalanceCmd {
    /// Wallet name from the config
    #[arg(short, long, value_name = "NAME")]
    pub wallet: Option<String>,
}

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    let config = load_config_or_default(app.config.as_ref()).context("Failed to load configuration")?;

    // Initialize logging based on flags
    init_logging(app.verbose, app.debug, &config.logging.level)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd, &config).await,
        Command::Buy(cmd) => buy_command(cmd, &config).await,
        Command::Balance(cmd) => balance_command(cmd, &config).await,
    }
}

/// Initialize logging system
fn init_logging(verbose: bool, debug: bool, configured: &str) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if debug {
        "debug"
    } else if verbose {
        "info"
    } else {
        configured
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Swap app whose wallet modal picks `wallet` by name
fn build_app(config: &Config, wallet: Option<String>) -> (SwapApp, Arc<PreferredWallet>) {
    let chooser = Arc::new(PreferredWallet::new(wallet));
    let modal = WalletModal::from_config(config, chooser.clone());
    (SwapApp::from_config(config, Arc::new(modal)), chooser)
}

/// Handle run command
async fn run_command(cmd: RunCmd, config: &Config) -> Result<()> {
    tracing::info!("Starting ENOC swap console on {}", config.network.name);
    let (app, chooser) = build_app(config, cmd.wallet);
    console::run(app, chooser).await
}

/// Handle buy command
async fn buy_command(cmd: BuyCmd, config: &Config) -> Result<()> {
    let (app, _) = build_app(config, cmd.wallet);
    let route = app.route().clone();

    let session = app.connect().await.context("Failed to connect wallet")?;
    println!("Connected: {} (chain {})", session.account(), session.chain_id());
    if !session.is_on(route.chain_id) {
        println!("Warning: {}", app.status());
    }

    println!("Buying {} with {} {}...", route.destination.symbol, cmd.amount, route.source.symbol);
    let result = app.buy(&cmd.amount).await;
    app.disconnect().await;

    let outcome = result.context("Purchase failed")?;
    println!("Approval tx: {}", outcome.approval.transaction_hash);
    println!("Swap tx:     {}", outcome.swap.transaction_hash);
    println!(
        "Spent {} {}. Check your wallet for {}.",
        format_units(outcome.request.amount_in, route.source.decimals),
        route.source.symbol,
        route.destination.symbol
    );

    Ok(())
}

/// Handle balance command
async fn balance_command(cmd: BalanceCmd, config: &Config) -> Result<()> {
    let (app, _) = build_app(config, cmd.wallet);

    let session = app.connect().await.context("Failed to connect wallet")?;
    let result = app.balances().await;
    app.disconnect().await;

    let balances = result.context("Failed to read balances")?;
    println!("Wallet: {}", session.account());
    println!("  {}", balances.source);
    println!("  {}", balances.destination);

    Ok(())
}
