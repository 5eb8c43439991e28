#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs naval scenarios with autonomous warships.

mod report;
mod scenario;
mod simulation;

use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::scenario::Scenario;

/// Runs a TOML naval scenario and prints what happened.
#[derive(Parser, Debug)]
#[command(name = "warship-sim")]
#[command(about = "Simulate warships patrolling, shelling and raiding a scenario map")]
struct Args {
    /// Path to the TOML scenario file.
    scenario: PathBuf,

    /// Overrides the number of ticks declared by the scenario.
    #[arg(long)]
    ticks: Option<u64>,

    /// Prints every world event as it is emitted.
    #[arg(long)]
    events: bool,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    log: String,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let source = fs::read_to_string(&args.scenario)
        .with_context(|| format!("failed to read scenario {}", args.scenario.display()))?;
    let scenario = Scenario::parse(&source)
        .with_context(|| format!("invalid scenario {}", args.scenario.display()))?;
    let ticks = args.ticks.unwrap_or(scenario.ticks);

    let mut simulation = scenario.build()?;
    let print_events = args.events;
    let summary = simulation.run(ticks, |event| {
        if print_events {
            println!("{event:?}");
        }
    })?;

    println!("{summary}");
    Ok(())
}
