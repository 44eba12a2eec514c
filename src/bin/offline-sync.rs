use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use offline_sync::domain::value_objects::{PendingWriteId, WritePayload};
use offline_sync::shared::logging;
use offline_sync::{AppConfig, AppState, WorkerEvent, WorkerReply};
use serde::Serialize;
use tracing::info;

#[derive(Parser)]
#[command(name = "offline-sync")]
#[command(about = "Inspect and drive the offline write queue", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = logging::DEFAULT_FILTER, env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging
    #[arg(long, env = "JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Connectivity, queue size and sync state
    Status,
    /// Queue a JSON write for the next sync pass
    Enqueue {
        /// Write payload as a JSON document
        payload: String,
    },
    /// List pending writes, oldest first
    List,
    /// Replay pending writes now
    Sync,
    /// Drop a pending write without sending it
    Discard { id: String },
    /// Pre-cache the application shell
    Install,
    /// Pre-cache the shell, then evict caches from previous versions
    Activate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level, cli.json_logs);

    let config = AppConfig::from_env();
    info!("Starting offline-sync v{}", env!("CARGO_PKG_VERSION"));

    let state = AppState::initialize(config)
        .await
        .context("failed to initialize offline subsystem")?;
    let result = run(&state, cli.command).await;
    state.shutdown().await;
    result
}

async fn run(state: &AppState, command: Commands) -> Result<()> {
    match command {
        Commands::Status => print_json(&state.client.status().await?),
        Commands::Enqueue { payload } => {
            let payload = WritePayload::from_json_str(&payload).map_err(anyhow::Error::msg)?;
            let id = state.client.enqueue_for_sync(payload).await?;
            println!("{id}");
            Ok(())
        }
        Commands::List => {
            let pending = state.client.list_pending().await?;
            print_json(&pending)
        }
        Commands::Sync => {
            let outcome = state.client.request_sync().await;
            match outcome.report() {
                Some(report) => print_json(report),
                None => {
                    println!("sync already running");
                    Ok(())
                }
            }
        }
        Commands::Discard { id } => {
            let id = PendingWriteId::parse(&id).map_err(anyhow::Error::msg)?;
            if state.client.discard(&id).await? {
                println!("discarded {id}");
            } else {
                println!("no pending write {id}");
            }
            Ok(())
        }
        Commands::Install => match state.worker.handle(WorkerEvent::Install).await? {
            WorkerReply::Installed { assets } => {
                println!("cached {assets} assets");
                Ok(())
            }
            other => anyhow::bail!("unexpected worker reply: {other:?}"),
        },
        Commands::Activate => {
            state.worker.handle(WorkerEvent::Install).await?;
            match state.worker.handle(WorkerEvent::Activate).await? {
                WorkerReply::Activated(report) => print_json(&report),
                other => anyhow::bail!("unexpected worker reply: {other:?}"),
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
