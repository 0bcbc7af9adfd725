//! Interactive console
//!
//! Line-based stand-in for the purchase page: one command per line, status
//! changes printed as they happen.

use std::sync::Arc;

use anyhow::Result;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::adapters::modal::PreferredWallet;
use crate::application::{SwapApp, SwapFlowError};
use crate::domain::{chain_name, WalletSession};

const HELP: &str = "\
Commands:
  connect [wallet]   connect a wallet (optionally by name)
  disconnect         end the wallet session
  buy <amount>       approve and swap <amount> of the source token
  balance            show token balances
  status             show the current status, account and network
  help               show this text
  quit               disconnect and exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Connect(Option<String>),
    Disconnect,
    Buy(String),
    Balance,
    Status,
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseCommandError {
    #[error("Unknown command '{0}'. Type 'help' for a list.")]
    Unknown(String),
    #[error("Usage: {0}")]
    Usage(&'static str),
}

impl ConsoleCommand {
    /// Parse one input line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseCommandError> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(None);
        };
        let rest: Vec<&str> = words.collect();

        let command = match head.to_ascii_lowercase().as_str() {
            "connect" => match rest.as_slice() {
                [] => ConsoleCommand::Connect(None),
                [name] => ConsoleCommand::Connect(Some(name.to_string())),
                _ => return Err(ParseCommandError::Usage("connect [wallet]")),
            },
            "disconnect" => ConsoleCommand::Disconnect,
            // The amount is passed through untouched; the purchase flow rejects bad input
            "buy" => match rest.as_slice() {
                [amount] => ConsoleCommand::Buy(amount.to_string()),
                _ => return Err(ParseCommandError::Usage("buy <amount>")),
            },
            "balance" | "balances" => ConsoleCommand::Balance,
            "status" | "account" => ConsoleCommand::Status,
            "help" | "?" => ConsoleCommand::Help,
            "quit" | "exit" => ConsoleCommand::Quit,
            other => return Err(ParseCommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// Active account and network, as shown by `status`
pub fn session_line(session: Option<&WalletSession>) -> String {
    let Some(session) = session else {
        return "No wallet connected".to_string();
    };

    let chain_id = session.chain_id();
    match chain_name(chain_id) {
        Some(name) => format!("Account {} on {} ({})", session.account(), name, chain_id),
        None => format!("Account {} on chain {}", session.account(), chain_id),
    }
}

/// Run the console until `quit`, end of input or Ctrl+C
pub async fn run(app: SwapApp, chooser: Arc<PreferredWallet>) -> Result<()> {
    let route = app.route().clone();
    println!(
        "Buy {} with {} on chain {}. Type 'help' for commands.",
        route.destination.symbol, route.source.symbol, route.chain_id
    );

    let printer = {
        let mut rx = app.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let phase = rx.borrow_and_update().clone();
                println!("[status] {}", phase);
            }
        })
    };

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutdown signal received");
                None
            }
        };
        let Some(line) = line else {
            break;
        };

        let command = match ConsoleCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        match command {
            ConsoleCommand::Connect(name) => {
                if name.is_some() {
                    chooser.set(name);
                }
                if let Ok(session) = app.connect().await {
                    println!("{}", session_line(Some(&session)));
                }
            }
            ConsoleCommand::Disconnect => app.disconnect().await,
            ConsoleCommand::Buy(amount) => {
                // Runs in the background so the console stays responsive
                let app = app.clone();
                tokio::spawn(async move {
                    match app.buy(&amount).await {
                        Ok(outcome) => println!("Swap tx: {}", outcome.swap.transaction_hash),
                        // Busy leaves the status untouched, so say it here
                        Err(e @ SwapFlowError::Busy) => println!("{}", e),
                        Err(_) => {}
                    }
                });
            }
            ConsoleCommand::Balance => match app.balances().await {
                Ok(balances) => {
                    println!("  {}", balances.source);
                    println!("  {}", balances.destination);
                }
                Err(e) => println!("{}", e),
            },
            ConsoleCommand::Status => {
                println!("{}", app.status());
                println!("{}", session_line(app.session().await.as_ref()));
            }
            ConsoleCommand::Help => println!("{}", HELP),
            ConsoleCommand::Quit => break,
        }
    }

    if app.is_busy() {
        tracing::warn!("Exiting with a purchase still waiting on the wallet");
    }
    app.disconnect().await;
    printer.abort();
    Ok(())
}
