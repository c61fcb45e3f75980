use anyhow::{Context, Result};
use clap::Parser;

use petka_engine::config::EngineConfig;
use petka_engine::game_data::GameData;
use petka_engine::headless::{read_input_script, run_script};
use petka_formats::BackgroundTable;

mod cli;
use cli::Args;

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match args.config.as_deref() {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    if args.seed.is_some() {
        config.rng_seed = args.seed;
    }

    let data = GameData::from_json_file(&args.game_data)?;
    let backgrounds = args
        .backgrounds
        .as_deref()
        .map(BackgroundTable::open)
        .transpose()
        .context("loading background table")?;
    let script = match args.input_script.as_deref() {
        Some(path) => read_input_script(path)?,
        None => Vec::new(),
    };

    let (mut engine, services) = data.into_engine(config, backgrounds)?;
    let log = run_script(&mut engine, &services, &script, args.tick_ms, args.ticks);

    for label in log.labels() {
        println!("{label}");
    }
    if engine.quit_requested() {
        println!("quit requested");
    }
    if let Some(path) = args.event_log_json.as_deref() {
        log.write_json(path)?;
        println!("event log written to {}", path.display());
    }
    Ok(())
}
