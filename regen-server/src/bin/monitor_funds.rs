//! Reload all funds every few seconds and mark what changed.

use clap::Parser;
use kanau::processor::Processor;
use regen_core::chain::LoadAllFunds;
use regen_core::utils::fund_diff::FundSnapshot;
use regen_server::cli::{ChainArgs, fund_reader, init_tracing};
use regen_server::report::render_dashboard_entry;
use regen_server::shutdown::shutdown_signal;
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::format_description;
use tokio::time::MissedTickBehavior;

/// How often the funds are reloaded.
const REFRESH_INTERVAL: Duration = Duration::from_secs(5);

/// Live dashboard of RegenThemFund funds
#[derive(Parser, Debug)]
#[command(name = "monitor-funds")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    chain: ChainArgs,
}

fn timestamp() -> String {
    OffsetDateTime::now_utc()
        .format(format_description!("[hour]:[minute]:[second] UTC"))
        .unwrap_or_default()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let reader = fund_reader(&args.chain.chain_config()?)?;

    let mut snapshot = FundSnapshot::new();
    let mut ticker = tokio::time::interval(REFRESH_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                println!("\nMonitoring stopped. Goodbye!");
                return Ok(());
            }

            _ = ticker.tick() => {
                let funds = match reader.process(LoadAllFunds).await {
                    Ok(funds) => funds,
                    Err(e) => {
                        tracing::warn!(error = %e, "Failed to load funds");
                        continue;
                    }
                };

                // Clear the terminal before redrawing.
                print!("\x1Bc");
                println!("FUND MONITOR - Last updated: {}", timestamp());
                println!("================================================\n");

                if funds.is_empty() {
                    println!("No funds found on chain.");
                    continue;
                }

                println!("Found {} funds:\n", funds.len());
                let changes = snapshot.diff(&funds);
                for (index, (fund, change)) in funds.iter().zip(&changes).enumerate() {
                    println!("{}", render_dashboard_entry(index, fund, change));
                }
                snapshot.replace(&funds);

                println!("Monitoring... (press Ctrl+C to exit)");
            }
        }
    }
}
