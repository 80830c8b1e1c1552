//! Print every fund of the factory with its details.

use clap::Parser;
use kanau::processor::Processor;
use regen_core::chain::LoadAllFunds;
use regen_server::cli::{ChainArgs, fund_reader, init_tracing};
use regen_server::report::render_fund;

/// List all RegenThemFund funds
#[derive(Parser, Debug)]
#[command(name = "get-funds")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    chain: ChainArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let reader = fund_reader(&args.chain.chain_config()?)?;
    println!("Fetching funds from factory {}...", reader.factory());

    let funds = reader.process(LoadAllFunds).await.map_err(|e| {
        tracing::error!("Failed to load funds: {}", e);
        e
    })?;

    if funds.is_empty() {
        println!("No funds found.");
        return Ok(());
    }

    println!("Found {} funds:\n", funds.len());
    for (index, fund) in funds.iter().enumerate() {
        println!("{}", render_fund(index, fund));
    }
    Ok(())
}
