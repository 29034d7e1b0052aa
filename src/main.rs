//! pathswitch daemon - exports the audio path manager on D-Bus and runs until
//! it receives SIGINT or SIGTERM.

use std::{error::Error, path::PathBuf, sync::Arc};

use clap::Parser;
use pathswitch::{
    config::{BusType, Config, LogLevel},
    services::AudioPathService,
    tracing_config,
};
use tokio::signal::unix::{SignalKind, signal};
use tracing::{Level, info, span};

#[derive(Parser)]
#[command(name = "pathswitch")]
#[command(about = "Audio path switching daemon")]
struct Args {
    /// Configuration file (defaults to $XDG_CONFIG_HOME/pathswitch/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Connect to the session bus instead of the configured one
    #[arg(long)]
    session: bool,

    /// Override the configured log level
    #[arg(long)]
    log_level: Option<LogLevel>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    if args.session {
        config.bus.bus_type = BusType::Session;
    }

    if let Some(level) = args.log_level {
        config.general.log_level = level;
    }

    let levels = tracing_config::init(config.general.log_level, config.general.log_to_file)?;
    let _span = span!(Level::INFO, "pathswitch_main").entered();
    info!(version = env!("CARGO_PKG_VERSION"), "Starting pathswitch");

    let service = AudioPathService::start(&config, Some(Arc::new(levels))).await?;

    wait_for_termination().await?;

    info!("Shutting down");
    service.shutdown().await;

    Ok(())
}

async fn wait_for_termination() -> Result<(), Box<dyn Error>> {
    let mut sigterm = signal(SignalKind::terminate())?;

    tokio::select! {
        result = tokio::signal::ctrl_c() => result?,
        _ = sigterm.recv() => {}
    }

    Ok(())
}
