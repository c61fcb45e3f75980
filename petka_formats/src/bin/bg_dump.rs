use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use petka_formats::BackgroundTable;

/// Print the room attachment table stored in a `backgrnd.bg` file.
#[derive(Parser, Debug)]
#[command(about = "Dump the background attachment table", version)]
struct Args {
    /// Path to backgrnd.bg
    table: PathBuf,

    /// Emit the table as JSON instead of the text listing
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let table = BackgroundTable::open(&args.table)?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&table).context("serializing background table to JSON")?;
        println!("{json}");
        return Ok(());
    }

    println!("{} rooms in {}", table.len(), args.table.display());
    for entry in table.entries() {
        println!("room {:>5} ({} attached)", entry.obj_id, entry.attached.len());
        for object in &entry.attached {
            println!(
                "  - {id:>5} at {x:>4},{y:>4} z={z:<4} walk={walk_x},{walk_y}",
                id = object.id,
                x = object.x,
                y = object.y,
                z = object.z,
                walk_x = object.walk_x,
                walk_y = object.walk_y
            );
        }
    }
    Ok(())
}
