mod config;
mod curl;
mod database;
mod monitoring;
mod pool;
mod schedule;
mod service;
mod validation;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use config::Config;
use database::models::HeaderPair;
use database::{LibsqlTargetStore, TargetStore, initialize_database};
use monitoring::{HttpProbeClient, ProbeExecutor};
use pool::{LibsqlManager, LibsqlPool};
use schedule::Schedule;
use service::{TargetService, TargetSpec};

#[derive(Parser)]
#[command(name = "keepup", version, about = "Keeps HTTP endpoints alive by probing them on a per-target schedule")]
struct Cli {
    /// Path to the config file (defaults to ~/.config/keepup/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a single sweep over all targets and print the report as JSON
    Sweep,
    /// Run sweeps in a loop until interrupted
    Watch {
        /// Seconds between sweeps
        #[arg(long, default_value_t = 300)]
        every: u64,
    },
    /// List all targets with their latest status
    List,
    /// Add a new target (either --url or --curl)
    Add {
        #[arg(long)]
        name: String,
        /// Endpoint URL (url mode)
        #[arg(long, conflicts_with = "curl")]
        url: Option<String>,
        /// Raw curl command (curl mode)
        #[arg(long)]
        curl: Option<String>,
        /// "key: value" header, repeatable (url mode only)
        #[arg(long = "header")]
        headers: Vec<String>,
        /// hourly | every6hours | daily | weekly (anything else behaves like daily)
        #[arg(long, default_value = "daily")]
        schedule: String,
    },
    /// Change a target's schedule
    SetSchedule { id: Uuid, schedule: String },
    /// Replace a url-mode target's headers
    SetHeaders {
        id: Uuid,
        #[arg(long = "header")]
        headers: Vec<String>,
    },
    /// Replace a curl-mode target's command
    SetCurl { id: Uuid, command: String },
    /// Delete a target
    Delete { id: Uuid },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_config(cli.config).context("failed to load configuration")?;

    let store: Arc<dyn TargetStore> = Arc::new(open_store(&config).await?);

    match cli.command {
        Command::Sweep => {
            let executor = build_executor(&config, store)?;
            let report = executor.run_sweep().await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Watch { every } => {
            let executor = build_executor(&config, store)?;
            info!(every, "starting sweep loop");
            let mut timer = tokio::time::interval(Duration::from_secs(every.max(1)));
            loop {
                timer.tick().await;
                match executor.run_sweep().await {
                    Ok(report) => {
                        info!(executed = report.executed, skipped = report.skipped, "sweep complete");
                    }
                    Err(e) => warn!("sweep failed: {e:#}"),
                }
            }
        }
        Command::List => {
            let service = TargetService::new(store);
            let now = SystemTime::now();
            for target in service.list_targets().await? {
                let next: DateTime<Utc> =
                    schedule::next_run_time(target.schedule, target.last_run_at, now).into();
                let code = target
                    .last_status_code
                    .map_or_else(|| "-".to_string(), |c| c.to_string());
                println!(
                    "{}  {:<24} {:<12} {:<8} {:>4}  next {}",
                    target.id,
                    target.name,
                    target.schedule,
                    target.last_status,
                    code,
                    next.format("%Y-%m-%d %H:%M UTC"),
                );
            }
        }
        Command::Add { name, url, curl, headers, schedule } => {
            let schedule = Schedule::parse(&schedule);
            let spec = match (url, curl) {
                (Some(url), None) => TargetSpec::Url {
                    name,
                    url,
                    headers: parse_header_args(&headers)?,
                    schedule,
                },
                (None, Some(command)) => TargetSpec::Curl { name, command, schedule },
                _ => bail!("exactly one of --url or --curl is required"),
            };
            let target = TargetService::new(store).add_target(spec).await?;
            println!("{}", target.id);
        }
        Command::SetSchedule { id, schedule } => {
            TargetService::new(store)
                .update_schedule(id, Schedule::parse(&schedule))
                .await?;
        }
        Command::SetHeaders { id, headers } => {
            TargetService::new(store)
                .update_headers(id, parse_header_args(&headers)?)
                .await?;
        }
        Command::SetCurl { id, command } => {
            TargetService::new(store).update_curl_command(id, command).await?;
        }
        Command::Delete { id } => {
            TargetService::new(store).delete_target(id).await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let log_format = std::env::var("RUST_LOG_FORMAT").unwrap_or_default();

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).init();
}

fn parse_header_args(raw: &[String]) -> Result<Vec<HeaderPair>> {
    raw.iter()
        .map(|entry| {
            let (key, value) = entry
                .split_once(':')
                .with_context(|| format!("header '{entry}' must be 'key: value'"))?;
            Ok(HeaderPair {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            })
        })
        .collect()
}

async fn open_store(config: &Config) -> Result<LibsqlTargetStore> {
    let db = libsql::Builder::new_local(&config.database.path).build().await?;
    let manager = LibsqlManager::new(db);
    let pool: LibsqlPool = deadpool::managed::Pool::builder(manager)
        .config(deadpool::managed::PoolConfig::default())
        .build()?;

    let conn = pool.get().await?;
    initialize_database(&conn).await?;

    Ok(LibsqlTargetStore::new_from_pool(pool))
}

fn build_executor(config: &Config, store: Arc<dyn TargetStore>) -> Result<ProbeExecutor> {
    let client = HttpProbeClient::new(Duration::from_secs(config.probe.timeout_seconds))?;
    Ok(ProbeExecutor::new(store, Arc::new(client)))
}
