use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rolemirror_core::config::Config;
use rolemirror_core::directory::{DirectorySnapshot, InMemoryDirectory};
use rolemirror_core::events::{EventHandler, MembershipEvent};
use rolemirror_core::logging::{init_logging_with_config, LogContext, LogLevel};
use rolemirror_core::metrics::init_metrics;
use rolemirror_core::model::UserId;
use rolemirror_core::sync::RoleSyncEngine;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(name = "rolemirror")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file (TOML). Falls back to ROLEMIRROR_* environment variables
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// Directory snapshot file (JSON or TOML); overrides the configured path
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate configuration, then print a summary
    CheckConfig,

    /// Reconcile one user and print the outcome as JSON
    Sync {
        /// User identifier shared by both spaces
        user_id: String,
    },

    /// Reconcile every member and print the sweep report as JSON
    Sweep {
        /// Walk the mirror space instead of the source space
        #[arg(long)]
        existing: bool,
    },

    /// Feed a JSON array of membership events through the event handler
    Replay {
        /// File containing the events
        events: PathBuf,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };

    if let Some(level) = &args.log_level {
        let level: LogLevel = level.parse()?;
        config.logging.level = level.as_str().to_string();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    if let Some(snapshot) = &args.snapshot {
        config.directory.snapshot_path = Some(snapshot.clone());
    }

    Ok(config)
}

fn load_directory(config: &Config) -> Result<Arc<InMemoryDirectory>> {
    let Some(path) = &config.directory.snapshot_path else {
        bail!("no directory snapshot configured (use --snapshot or ROLEMIRROR_SNAPSHOT_PATH)");
    };

    let snapshot = DirectorySnapshot::from_file(path)
        .with_context(|| format!("loading directory snapshot from {}", path.display()))?;
    Ok(Arc::new(InMemoryDirectory::from_snapshot(snapshot)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(config.logging.to_log_config()?)?;
    if config.metrics.enabled {
        init_metrics();
    }

    info!("Configuration loaded successfully");

    match args.command {
        Command::CheckConfig => {
            println!("source space:   {}", config.sync.source_space_id);
            println!("mirror space:   {}", config.sync.mirror_space_id);
            println!("tracked marker: {}", config.sync.tracked_marker);
            println!("token:          {}", config.directory.redacted_token());
            println!("log level:      {}", config.logging.level);
            if config.triggers.all_disabled() {
                println!("warning: every sync trigger is disabled");
            }
        }
        Command::Sync { user_id } => {
            let engine = build_engine(&config)?;
            let outcome = engine.sync_status(&UserId::new(user_id)).await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if !outcome.success {
                std::process::exit(1);
            }
        }
        Command::Sweep { existing } => {
            let engine = build_engine(&config)?;
            let result = if existing {
                engine.sync_existing_members().await
            } else {
                engine.sync_all_members().await
            };

            match result {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(err) => {
                    error!("Sweep aborted: {}", err);
                    std::process::exit(2);
                }
            }
        }
        Command::Replay { events } => {
            let contents = std::fs::read_to_string(&events)
                .with_context(|| format!("reading events from {}", events.display()))?;
            let events: Vec<MembershipEvent> =
                serde_json::from_str(&contents).context("parsing membership events")?;

            let engine = Arc::new(build_engine(&config)?);
            let handler = EventHandler::new(engine, config.triggers)
                .with_call_timeout(config.sync.call_timeout);

            let (tx, rx) = mpsc::channel(events.len().max(1));
            let producer = tokio::spawn(async move {
                for event in events {
                    if tx.send(event).await.is_err() {
                        break;
                    }
                }
            });

            let stats = handler.run(rx).await;
            producer.await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }

    Ok(())
}

fn build_engine(config: &Config) -> Result<RoleSyncEngine<InMemoryDirectory, InMemoryDirectory>> {
    let directory = load_directory(config)?;
    Ok(RoleSyncEngine::from_config(
        directory.clone(),
        directory,
        &config.sync,
        LogContext::global(),
    ))
}
