//! enoc-swap - Buy ENOC with USDT on Polygon through QuickSwap

use anyhow::Result;
use clap::Parser;

use enoc_swap::adapters::cli::{self, CliApp};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (ENOC_RPC_URL and RUST_LOG live here)
    dotenvy::dotenv().ok();

    let app = CliApp::parse();
    cli::execute(app).await
}
