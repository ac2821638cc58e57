//! DCA auto-invest bot - entry point.

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use dca_bot::{AppConfig, Engine, SystemClock};
use dca_exchange::{FailoverClient, RestSpotApi};
use dca_history::HistoryWriter;

/// DCA auto-invest bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DCA_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dca_bot::init_logging();

    info!("Starting DCA bot v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(args.config)?;
    config.validate()?;
    info!(
        plans = config.plans.len(),
        endpoints = config.endpoints.len(),
        history_dir = %config.history_dir,
        "Configuration loaded"
    );

    let api = RestSpotApi::new(config.api_key.clone())?;
    let failover = FailoverClient::new(api, config.endpoints.clone(), config.max_retries);
    let history = HistoryWriter::new(&config.history_dir)?;

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, shutting down");
            signal_token.cancel();
        }
    });

    let engine = Engine::new(config.plans, failover, history, shutdown, SystemClock);
    engine.run().await?;

    Ok(())
}
