//! CLI definitions for Durapipe.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Durapipe CLI.
#[derive(Parser)]
#[command(name = "durapipe")]
#[command(about = "Deterministic multi-step pipeline orchestrator")]
#[command(version)]
pub(crate) struct Cli {
    /// State storage directory
    #[arg(long, env = "DURAPIPE_STATE_DIR", default_value = ".durapipe", global = true)]
    pub state_dir: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Run the processing workflow over a payload
    Run {
        /// Payload file (JSON)
        #[arg(long, conflicts_with = "json")]
        payload: Option<PathBuf>,

        /// Inline JSON payload
        #[arg(long)]
        json: Option<String>,

        /// Orchestration instance id (defaults to a random UUID)
        #[arg(long)]
        instance_id: Option<String>,

        /// Replay the instance after the run and verify determinism
        #[arg(long)]
        replay: bool,
    },

    /// Show a persisted processing result
    Show {
        /// Orchestration instance id
        instance_id: String,
    },
}
