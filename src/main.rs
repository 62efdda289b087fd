//! # bodsight command line
//!
//! ```bash
//! bodsight run --data-dir data/bods --out reports
//! bodsight run --data-dir data/bods --query q131 --query q132 --offline
//! bodsight codelist interest-type --case snake
//! bodsight view --data-dir data/bods     # with the `gui` feature
//! ```

#![warn(clippy::all, rust_2018_idioms)]

mod cli;

use anyhow::Result;
use clap::Parser as _;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    bodsight::logging::init(cli.log_file)?;

    if let Err(e) = cli::run_command(cli.command) {
        tracing::error!("{e:#}");
        return Err(e);
    }
    Ok(())
}
