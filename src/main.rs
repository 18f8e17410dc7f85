//! LotteryClient - Main Entry Point
//!
//! Sends the agency's bets to the lottery server, waits for the draw and
//! reports the winners.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use lottery_client::config::load_config_with_overrides;
use lottery_client::{
    BatchSource, SessionController, SessionOutcome, ShutdownSignal, TcpConnector,
    TracingObserver,
};

/// CLI arguments for the application
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Agency identifier, overrides the configuration
    #[arg(long)]
    id: Option<u32>,

    /// Server address, overrides the configuration
    #[arg(long)]
    server_address: Option<String>,

    /// Bet file, defaults to `<data_dir>/agency-<id>.csv`
    #[arg(long)]
    data_file: Option<PathBuf>,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    let mut overrides = Vec::new();
    if let Some(id) = args.id {
        overrides.push(("client.id", id.to_string()));
    }
    if let Some(address) = args.server_address {
        overrides.push(("client.server_address", address));
    }
    let config = load_config_with_overrides(Some(&args.config), &overrides)
        .context("loading configuration")?;

    // Initialize logging
    let level = parse_level(args.log_level.as_deref().unwrap_or(&config.settings.log_level));
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!(
        agency = config.client.id,
        server = %config.client.server_address,
        max_batch_amount = config.client.max_batch_amount,
        loop_period_ms = config.client.loop_period_ms,
        "Configuration loaded"
    );

    let shutdown = ShutdownSignal::new();
    tokio::spawn(wait_for_signal(shutdown.clone()));

    let bets_path = args.data_file.unwrap_or_else(|| config.bets_path());
    let mut source = BatchSource::open(
        &bets_path,
        config.client.id,
        config.client.max_batch_amount,
    )
    .await
    .with_context(|| format!("opening {}", bets_path.display()))?;

    let mut session = SessionController::new(
        TcpConnector,
        config.session_config(),
        shutdown,
        TracingObserver::new(config.client.id),
    );

    match session.run(&mut source).await? {
        SessionOutcome::Completed(report) => {
            info!(
                action = "winners_query",
                result = "success",
                agency = config.client.id,
                winners = report.winners.len(),
                batches = report.batches_sent,
                bets = report.bets_sent,
                skipped_lines = source.skipped(),
                "Session finished"
            );
        }
        SessionOutcome::Cancelled { state, .. } => {
            warn!(agency = config.client.id, %state, "Session cancelled");
        }
    }

    Ok(())
}

/// Raise the shutdown flag on SIGINT or SIGTERM
async fn wait_for_signal(shutdown: ShutdownSignal) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let terminate = async {
            signal(SignalKind::terminate())?.recv().await;
            Ok::<_, std::io::Error>(())
        };

        tokio::select! {
            true = shutdown.trigger_on("SIGINT", tokio::signal::ctrl_c()) => {}
            true = shutdown.trigger_on("SIGTERM", terminate) => {}
            else => warn!("No shutdown signal available, running until done"),
        }
    }

    #[cfg(not(unix))]
    {
        shutdown.trigger_on("Ctrl-C", tokio::signal::ctrl_c()).await;
    }
}
