//! Print the existing funds, then every new one as it is created.

use clap::Parser;
use kanau::processor::Processor;
use regen_core::chain::LoadAllFunds;
use regen_core::events::fund_created_channel;
use regen_core::processors::FactoryWatcher;
use regen_server::cli::{ChainArgs, fund_reader, init_tracing};
use regen_server::report::render_fund;
use regen_server::shutdown::shutdown_signal;
use tokio::sync::watch;

/// Follow RegenThemFund fund creation
#[derive(Parser, Debug)]
#[command(name = "watch-funds")]
#[command(version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    chain: ChainArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let chain = args.chain.chain_config()?;
    let reader = fund_reader(&chain)?;

    match reader.process(LoadAllFunds).await {
        Ok(funds) if funds.is_empty() => println!("No funds found."),
        Ok(funds) => {
            println!("Found {} existing funds:\n", funds.len());
            for (index, fund) in funds.iter().enumerate() {
                println!("{}", render_fund(index, fund));
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to load existing funds"),
    }

    let (event_tx, mut event_rx) = fund_created_channel();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let watcher = FactoryWatcher::new(
        reader.rpc().clone(),
        reader.factory(),
        chain.poll_interval,
        event_tx,
    );
    let watcher_handle = tokio::spawn(watcher.run(shutdown_rx));

    println!("Listening for new funds... (press Ctrl+C to exit)");

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut watcher_stopped = false;
    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            created = event_rx.recv() => {
                let Some(created) = created else {
                    watcher_stopped = true;
                    break;
                };
                println!("New fund created!");
                println!("- Name: {}", created.event.name);
                println!("- Address: {}", created.event.address);
                println!("- Owner: {}", created.event.owner);
                println!("- Goal: {}", created.event.goal);
                if let Some(block) = created.block_number {
                    println!("- Block: {block}");
                }
                println!();
            }
        }
    }

    shutdown_tx.send_replace(true);
    let _ = watcher_handle.await;
    if watcher_stopped {
        anyhow::bail!("factory watcher stopped, see the log for the cause");
    }
    println!("Stopped watching. Goodbye!");
    Ok(())
}
