//! Sync command - one full two-way pass over the working directory
//!
//! 1. Derives the remote root from the working directory
//! 2. Creates the adapters (directory store, local filesystem, console)
//! 3. Captures the session and runs the SyncEngine
//! 4. Displays the run summary

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;

use upsync_core::config::Config;
use upsync_core::domain::SyncPath;
use upsync_store::DirectoryStore;
use upsync_sync::engine::{SyncEngine, SyncReport};
use upsync_sync::filesystem::LocalFileSystemAdapter;

use crate::account::remote_root_for;
use crate::output::{format_duration, get_formatter, plural, ConsoleReporter, OutputFormat};

/// Options for a sync run
#[derive(Debug, Clone)]
pub struct SyncCommand {
    /// Suppress per-entry lines
    pub quiet: bool,
}

impl SyncCommand {
    /// Runs the sync rooted at `working_dir`
    pub async fn execute(&self, working_dir: &Path, config: &Config, format: OutputFormat) -> Result<()> {
        let formatter = get_formatter(matches!(format, OutputFormat::Json));

        let local_root = SyncPath::new(working_dir.to_path_buf())
            .context("Working directory is not an absolute path")?;
        let remote_root = remote_root_for(&working_dir.to_string_lossy())
            .context("Cannot derive the remote root from the working directory")?;

        if !self.quiet {
            formatter.line(&format!("working directory {}", remote_root));
        }

        let store = DirectoryStore::from_config(&config.store);
        if !store.root().is_dir() {
            bail!("Store root {} is not a directory", store.root().display());
        }
        info!(store_root = %store.root().display(), "Using directory store");

        let engine = SyncEngine::new(
            Arc::new(store),
            Arc::new(LocalFileSystemAdapter::new()),
            Arc::new(ConsoleReporter::new(format, self.quiet)),
            config,
        );

        let session = engine
            .begin_session(remote_root.clone(), local_root)
            .await
            .context("Failed to read the previous sync time")?;
        let report = match engine.run(&session).await {
            Ok(report) => report,
            Err(err) if err.is_structural() => {
                return Err(anyhow::Error::new(err).context(format!(
                    "Sync of {remote_root} stopped; resolve the entry by hand and run again"
                )))
            }
            Err(err) => return Err(err).with_context(|| format!("Sync of {} failed", remote_root)),
        };

        if matches!(format, OutputFormat::Json) {
            let mut json = serde_json::to_value(&report)?;
            json["remote_root"] = serde_json::Value::String(remote_root.to_string());
            formatter.print_json(&json);
        } else {
            print_summary(formatter.as_ref(), &report);
        }

        Ok(())
    }
}

fn print_summary(formatter: &dyn crate::output::OutputFormatter, report: &SyncReport) {
    if report.transfers() == 0 && report.local_dirs_created == 0 && report.remote_dirs_created == 0 {
        formatter.success("Already up to date");
    } else {
        formatter.success(&format!(
            "Sync completed in {}",
            format_duration(report.duration_ms)
        ));
    }

    if report.files_pulled > 0 {
        formatter.info(&format!(
            "Pulled:     {} file{}",
            report.files_pulled,
            plural(report.files_pulled)
        ));
    }
    if report.files_pushed > 0 {
        formatter.info(&format!(
            "Pushed:     {} file{}",
            report.files_pushed,
            plural(report.files_pushed)
        ));
    }
    let dirs = report.local_dirs_created + report.remote_dirs_created;
    if dirs > 0 {
        formatter.info(&format!("Created:    {} director{}", dirs, if dirs == 1 { "y" } else { "ies" }));
    }
    if report.skipped() > 0 {
        formatter.info(&format!(
            "Skipped:    {} entr{}",
            report.skipped(),
            if report.skipped() == 1 { "y" } else { "ies" }
        ));
    }
    if report.placeholders_created > 0 {
        formatter.info(&format!(
            "Unreadable: {} placeholder{}",
            report.placeholders_created,
            plural(report.placeholders_created)
        ));
    }
}
