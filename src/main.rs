//! Durapipe - deterministic pipeline orchestration over a durable
//! execution engine.
//!
//! Main entry point for the Durapipe CLI.

mod cli;
mod register;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use durapipe_protocols::StateStore;
use durapipe_runtime::FileStateStore;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Run {
            payload,
            json,
            instance_id,
            replay,
        } => run(cli.state_dir, payload, json, instance_id, replay).await,
        Commands::Show { instance_id } => show(cli.state_dir, instance_id).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .init();
}

async fn run(
    state_dir: PathBuf,
    payload: Option<PathBuf>,
    json: Option<String>,
    instance_id: Option<String>,
    replay: bool,
) -> anyhow::Result<()> {
    let raw: serde_json::Value = match (payload, json) {
        (Some(path), None) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read payload file {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("invalid JSON in payload file {}", path.display()))?
        }
        (None, Some(inline)) => {
            serde_json::from_str(&inline).context("invalid inline JSON payload")?
        }
        _ => anyhow::bail!("provide exactly one of --payload or --json"),
    };

    let store = Arc::new(FileStateStore::new(&state_dir).await?);
    let (engine, units) = register::build_engine(store.clone())?;

    let instance_id = instance_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let output = engine.run(units.workflow.name(), &instance_id, raw).await?;
    info!("Workflow finished (instance {}): {}", instance_id, output);

    if replay {
        let replayed = engine.replay(&instance_id).await?;
        anyhow::ensure!(
            replayed == output,
            "replay produced a different outcome than the original run"
        );
        info!("Replay verified: identical outcome, no repeated side effects");
    }

    match store.get(&instance_id).await? {
        Some(result) => println!("{}", serde_json::to_string_pretty(&result)?),
        None => anyhow::bail!("no persisted result for instance {}", instance_id),
    }
    Ok(())
}

async fn show(state_dir: PathBuf, instance_id: String) -> anyhow::Result<()> {
    let store = FileStateStore::new(&state_dir).await?;
    match store.get(&instance_id).await? {
        Some(result) => {
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        None => anyhow::bail!("no persisted result for instance {}", instance_id),
    }
}
