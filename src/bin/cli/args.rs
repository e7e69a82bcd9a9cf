//! Command-line argument definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// nginx configuration parser and location tester
#[derive(Parser, Debug)]
#[command(name = "ngx-config")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a configuration and emit the payload as JSON
    Parse(ParseArgs),

    /// Test which location block a URL resolves to
    Lt(LocationArgs),
}

/// Arguments for the parse command
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// nginx.conf file location
    #[arg(short, long)]
    pub file: PathBuf,

    /// Parse the file alone, without expanding includes
    #[arg(short, long)]
    pub single: bool,

    /// Directory to write dump.json into (stdout if not given)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the lt command
#[derive(Args, Debug)]
pub struct LocationArgs {
    /// nginx.conf file location
    #[arg(short, long)]
    pub file: PathBuf,

    /// Target URL or request path
    #[arg(short, long)]
    pub url: String,

    /// Parse the file alone, without expanding includes
    #[arg(short, long)]
    pub single: bool,
}
