//! ngx-config CLI tool
//!
//! Command-line interface for parsing nginx configurations and testing
//! location matching

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Parse(args) => cli::commands::parse::run(&args)?,
        Commands::Lt(args) => cli::commands::location::run(&args)?,
    }

    Ok(())
}
