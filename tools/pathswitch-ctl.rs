//! pathswitch-ctl - command line client for a running pathswitch daemon.

use std::{collections::HashMap, error::Error};

use clap::{Parser, Subcommand, ValueEnum};
use pathswitch::{
    services::audio_path::{
        ReadyState,
        proxy::{AudioPathApplianceProxy, AudioPathManagerProxy, DebugLoggingProxy},
    },
    tracing_config,
};
use serde_json::json;
use zbus::Connection;

#[derive(Parser)]
#[command(name = "pathswitch-ctl")]
#[command(about = "Inspect and drive the pathswitch daemon")]
struct Cli {
    /// Talk to the daemon on the session bus
    #[arg(long, global = true)]
    session: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered sources and players
    Paths,
    /// Show the selected source and active player
    Current,
    /// Show the active player
    Active,
    /// Request the audio path for a source
    Request { source_id: String },
    /// Release the audio path
    Release {
        /// Keep the player active
        #[arg(long)]
        keep_player: bool,
    },
    /// Report an appliance ready state
    ReadyState {
        #[arg(value_enum)]
        state: ReadyStateArg,
    },
    /// Show the appliance state
    Appliance,
    /// Show or change the daemon log level
    LogLevel { level: Option<String> },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReadyStateArg {
    Unknown,
    Suspended,
    Blocked,
    Ready,
}

impl From<ReadyStateArg> for ReadyState {
    fn from(arg: ReadyStateArg) -> Self {
        match arg {
            ReadyStateArg::Unknown => ReadyState::Unknown,
            ReadyStateArg::Suspended => ReadyState::Suspended,
            ReadyStateArg::Blocked => ReadyState::AudioPathBlocked,
            ReadyStateArg::Ready => ReadyState::Ready,
        }
    }
}

fn or_none(id: &str) -> &str {
    if id.is_empty() { "<none>" } else { id }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    tracing_config::init_cli_mode()?;

    let connection = if cli.session {
        Connection::session().await?
    } else {
        Connection::system().await?
    };

    match cli.command {
        Commands::Paths => {
            let manager = AudioPathManagerProxy::new(&connection).await?;
            let paths = manager.get_paths().await?;

            if cli.json {
                let entries: Vec<_> = paths
                    .iter()
                    .map(|(source, player)| json!({ "source": source, "player": player }))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                for (source, player) in &paths {
                    println!("{:<24} -> {}", or_none(source), or_none(player));
                }
            }
        }
        Commands::Current => {
            let manager = AudioPathManagerProxy::new(&connection).await?;
            let (source, player) = manager.get_current_path().await?;

            if cli.json {
                println!("{}", json!({ "source": source, "player": player }));
            } else {
                println!("source: {}", or_none(&source));
                println!("player: {}", or_none(&player));
            }
        }
        Commands::Active => {
            let manager = AudioPathManagerProxy::new(&connection).await?;
            let (id, name) = manager.get_active_player().await?;

            if cli.json {
                println!("{}", json!({ "id": id, "name": name }));
            } else if id.is_empty() {
                println!("No active player");
            } else {
                println!("{id} ({name})");
            }
        }
        Commands::Request { source_id } => {
            let manager = AudioPathManagerProxy::new(&connection).await?;
            let (player, switched) = manager.request_source(&source_id, HashMap::new()).await?;

            if cli.json {
                println!("{}", json!({ "player": player, "switched": switched }));
            } else {
                let how = if switched { "switched to" } else { "kept" };
                println!("{source_id}: {how} player {player}");
            }
        }
        Commands::Release { keep_player } => {
            let manager = AudioPathManagerProxy::new(&connection).await?;
            manager.release_path(!keep_player, HashMap::new()).await?;

            if cli.json {
                println!("{}", json!({ "released": true }));
            }
        }
        Commands::ReadyState { state } => {
            let appliance = AudioPathApplianceProxy::new(&connection).await?;
            appliance
                .set_ready_state(u8::from(ReadyState::from(state)))
                .await?;
        }
        Commands::Appliance => {
            let appliance = AudioPathApplianceProxy::new(&connection).await?;
            let (power, audio_path) = appliance.get_state().await?;

            if cli.json {
                println!("{}", json!({ "power": power, "audio_path": audio_path }));
            } else {
                println!("power: {power}, audio path: {audio_path}");
            }
        }
        Commands::LogLevel { level } => {
            let logging = DebugLoggingProxy::new(&connection).await?;
            let previous = logging.debug_level(level.as_deref().unwrap_or_default()).await?;

            if cli.json {
                println!("{}", json!({ "previous": previous, "requested": level }));
            } else if level.is_some() {
                println!("log level changed from {previous}");
            } else {
                println!("{previous}");
            }
        }
    }

    Ok(())
}
