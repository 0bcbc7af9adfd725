//! CLI Adapter
//!
//! Command-line interface for the ENOC swap client.
//! Uses clap derive macros for argument parsing.

mod commands;
pub mod console;

pub use commands::{BalanceCmd, BuyCmd, CliApp, Command, RunCmd};
pub use console::{ConsoleCommand, ParseCommandError};

use anyhow::Result;

/// Execute the CLI command
pub async fn execute(app: CliApp) -> Result<()> {
    commands::execute(app).await
}
