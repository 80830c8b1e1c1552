//! RegenThemFund event relay.
//!
//! Watches the factory contract for new funds and rebroadcasts them, batched,
//! to every WebSocket subscriber.

use clap::Parser;
use regen_core::chain::JsonRpcClient;
use regen_core::config::ConfigStore;
use regen_core::events::fund_created_channel;
use regen_core::processors::{EventRelay, FactoryWatcher};
use regen_server::cli::{ChainArgs, init_tracing};
use regen_server::config::ConfigLoader;
use regen_server::server::{build_router, run_server};
use regen_server::shutdown::{spawn_config_reload_handler, spawn_shutdown_forwarder};
use regen_server::state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;

/// RegenThemFund relay - batched WebSocket feed of new funds
#[derive(Parser, Debug)]
#[command(name = "regen-relay")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (optional)
    #[arg(short, long, env = "REGEN_CONFIG", default_value = "./regen-relay.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3001)
    #[arg(short, long, env = "REGEN_LISTEN")]
    listen: Option<SocketAddr>,

    #[command(flatten)]
    chain: ChainArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();

    tracing::info!("Starting regen-relay v{}", env!("CARGO_PKG_VERSION"));

    let config_loader = Arc::new(ConfigLoader::new(
        &args.config,
        args.listen,
        args.chain.overrides(),
    ));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let factory = loaded_config.chain.resolve_factory().map_err(|e| {
        tracing::error!("Failed to resolve factory address: {}", e);
        e
    })?;
    tracing::info!(
        rpc = %loaded_config.chain.rpc_url,
        %factory,
        "Chain configuration loaded"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);
    spawn_shutdown_forwarder(shutdown_tx.clone());

    // Processors
    let relay_config = ConfigStore::new(loaded_config.relay);
    let relay = EventRelay::new(relay_config.clone());
    let (event_tx, event_rx) = fund_created_channel();

    let rpc = Arc::new(JsonRpcClient::new(loaded_config.chain.rpc_url.clone()));
    let watcher = FactoryWatcher::new(rpc, factory, loaded_config.chain.poll_interval, event_tx);
    let watcher_handle = tokio::spawn(watcher.run(shutdown_rx.clone()));
    let relay_handle = tokio::spawn(relay.clone().run(
        shutdown_rx.clone(),
        event_rx,
        relay_config.subscribe(),
    ));

    // Spawn config reload handler (listens for SIGHUP)
    let reload_notify = spawn_config_reload_handler(config_loader, relay_config);

    let router = build_router(AppState::new(relay, shutdown_rx.clone()));

    tracing::info!("Starting HTTP server on {}", loaded_config.listen);
    let result = run_server(router, loaded_config.listen, shutdown_rx).await;

    // Stop the background tasks even if the server failed to start.
    shutdown_tx.send_replace(true);
    reload_notify.notify_one();
    let _ = tokio::join!(watcher_handle, relay_handle);
    tracing::info!("Relay shutdown complete");

    result.map_err(Into::into)
}
