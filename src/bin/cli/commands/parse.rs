//! Parse command implementation

use crate::cli::args::ParseArgs;
use anyhow::{Context, Result};
use colored::Colorize;
use ngx_config::{parse_file, ParseOptions};
use std::fs;

pub fn run(args: &ParseArgs) -> Result<()> {
    let options = ParseOptions {
        single_file: args.single,
        ..Default::default()
    };

    let payload = parse_file(&args.file, &options);

    // analyzer errors ride along in the payload; only a payload with nothing
    // successfully parsed is fatal
    if !payload.has_successful_config() {
        match payload.first_error() {
            Some(err) => anyhow::bail!("{err}"),
            None => anyhow::bail!("no configuration could be parsed"),
        }
    }

    let json = serde_json::to_string_pretty(&payload).context("failed to serialize payload")?;

    if let Some(output) = &args.output {
        fs::create_dir_all(output)
            .with_context(|| format!("failed to create {}", output.display()))?;
        let path = output.join("dump.json");
        fs::write(&path, &json).with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("{} {}", "✓ wrote".green().bold(), path.display());
    } else {
        println!("{json}");
    }

    Ok(())
}
