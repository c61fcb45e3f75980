use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    about = "Headless room runtime: replays scripted input against JSON game data",
    version
)]
pub struct Args {
    /// JSON game data (objects, reactions, rooms, resources)
    #[arg(long)]
    pub game_data: PathBuf,

    /// Binary background attachment table; overrides the one in the game data
    #[arg(long)]
    pub backgrounds: Option<PathBuf>,

    /// Engine configuration JSON
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// JSON list of input events to replay
    #[arg(long)]
    pub input_script: Option<PathBuf>,

    /// Path to write the event log as JSON
    #[arg(long)]
    pub event_log_json: Option<PathBuf>,

    /// Ticks to run after the script finishes
    #[arg(long, default_value_t = 1)]
    pub ticks: u32,

    /// Milliseconds per tick
    #[arg(long, default_value_t = 100)]
    pub tick_ms: u32,

    /// Seed for scripted random steps; overrides the configuration
    #[arg(long)]
    pub seed: Option<u64>,
}
