//! upsync CLI - Two-way sync of the working directory with a remote store
//!
//! Run from inside the local copy of a user's tree, e.g.
//! `~/sync/alice@example.com/docs`. One invocation is one full pass: newer
//! files are copied in either direction and missing directories are created
//! on both sides. Nothing is ever deleted.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use upsync_core::config::Config;

mod account;
mod commands;
mod output;

use commands::sync::SyncCommand;
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(
    name = "upsync",
    version,
    about = "Two-way, latest-wins sync of the working directory with a remote store"
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Log filter used when `RUST_LOG` is not set
    fn log_filter(&self, config: &Config) -> String {
        match self.verbose {
            0 => config.logging.level.clone(),
            1 => "debug".to_string(),
            _ => "trace".to_string(),
        }
    }

    /// Loads the config, plus a warning to log once tracing is set up
    ///
    /// An explicit `--config` must load. A broken default config file falls
    /// back to the defaults.
    fn load_config(&self) -> Result<(Config, Option<String>)> {
        match &self.config {
            Some(path) => {
                let config = Config::load(path)
                    .with_context(|| format!("Failed to load config from {}", path.display()))?;
                Ok((config, None))
            }
            None => Ok(load_default_config(&Config::default_path())),
        }
    }
}

fn load_default_config(path: &Path) -> (Config, Option<String>) {
    match Config::load_if_present(path) {
        Ok(config) => (config.unwrap_or_default(), None),
        Err(err) => (
            Config::default(),
            Some(format!(
                "Ignoring config file {} and using defaults: {err:#}",
                path.display()
            )),
        ),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, config_warning) = cli.load_config()?;

    // Setup tracing
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter(&config)));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Some(message) = config_warning {
        warn!("{message}");
    }

    let problems = config.validate();
    if !problems.is_empty() {
        let listed: Vec<String> = problems.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", listed.join("\n  "));
    }

    let working_dir = std::env::current_dir().context("Cannot determine the working directory")?;
    debug!(working_dir = %working_dir.display(), "Starting upsync");

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    SyncCommand { quiet: cli.quiet }
        .execute(&working_dir, &config, format)
        .await
}
