//! parking-report - Main Entry Point

use clap::Parser;
use parking_report::{run, Cli};

fn main() -> anyhow::Result<()> {
    run(Cli::parse())
}
