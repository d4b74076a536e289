mod report;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use receipts_core::{Dataset, EXPECTED_FORMAT};
use tracing_subscriber::EnvFilter;

const NO_COMMAND_HINT: &str =
    "Please upload a JSON file to get started (see `receipts-cli format`)";

#[derive(Debug, Parser)]
#[command(name = "receipts-cli")]
#[command(about = "Receipt analytics command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the JSON layout uploads must follow
    Format,
    /// Load a receipts file and report how many records it holds
    Load {
        /// Path to a JSON array of receipt line items
        path: PathBuf,
    },
    /// Load a receipts file and print a markdown report of every dashboard tab
    Report {
        /// Path to a JSON array of receipt line items
        path: PathBuf,
        /// Entries to keep in each "top N" table (defaults to RECEIPTS_TOP_N)
        #[arg(long)]
        top: Option<usize>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Some(text) = static_output(cli.command.as_ref()) {
        println!("{text}");
        return Ok(());
    }

    let config = receipts_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Load { path }) => {
            let dataset = load_dataset(&path)?;
            println!("Loaded {} records", dataset.len());
        }
        Some(Commands::Report { path, top }) => {
            let dataset = load_dataset(&path)?;
            let top = top.unwrap_or(config.top_n).max(1);
            print!("{}", report::render_report(&dataset, top)?);
        }
        Some(Commands::Format) | None => {}
    }

    Ok(())
}

/// Output for commands that need neither configuration nor logging, so a bad
/// `RECEIPTS_*` variable cannot break them.
fn static_output(command: Option<&Commands>) -> Option<&'static str> {
    match command {
        Some(Commands::Format) => Some(EXPECTED_FORMAT),
        None => Some(NO_COMMAND_HINT),
        Some(Commands::Load { .. } | Commands::Report { .. }) => None,
    }
}

/// Reads and normalizes a receipts file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or fails ingestion; the
/// ingestion message is prefixed the same way the dashboard shows it.
fn load_dataset(path: &Path) -> anyhow::Result<Dataset> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let dataset = receipts_ingest::normalize(&raw)
        .map_err(|e| anyhow::anyhow!("Error processing file: {e}"))?;
    tracing::info!(path = %path.display(), records = dataset.len(), "receipts file loaded");
    Ok(dataset)
}

#[cfg(test)]
mod tests;
