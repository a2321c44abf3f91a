//! Local filesystem adapter (secondary/driven adapter)
//!
//! Implements [`ILocalFileSystem`] using `tokio::fs` for async file operations.
//!
//! ## Design Decisions
//!
//! - **Atomic writes**: Uses write-to-temp + rename so a pull interrupted
//!   half way never leaves a truncated file behind. Permission bits are
//!   applied to the temporary file before the rename. Temporary names are
//!   reserved (see [`is_temp_name`]) and dropped from listings.
//! - **lstat listings**: Directory entries are inspected without following
//!   symbolic links, so the engine can refuse them.
//! - **Explicit times**: Modification times are set through `filetime` on
//!   the blocking pool, at whole-second precision.

use std::io::Write;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;

use anyhow::{anyhow, bail, Context};
use filetime::FileTime;
use tracing::{debug, instrument};
use upsync_core::{
    domain::entry::{is_temp_name, LocalEntry, TEMP_PREFIX, TEMP_SUFFIX},
    domain::newtypes::{SyncPath, Timestamp},
    ports::local_filesystem::ILocalFileSystem,
};

// ============================================================================
// LocalFileSystemAdapter struct
// ============================================================================

/// Adapter that bridges the [`ILocalFileSystem`] port to the real filesystem.
///
/// Zero-sized: every operation takes its context from the [`SyncPath`]
/// arguments.
#[derive(Debug, Clone, Default)]
pub struct LocalFileSystemAdapter;

impl LocalFileSystemAdapter {
    /// Create a new `LocalFileSystemAdapter`.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Writes `data` to a temporary sibling of `target`, applies `mode`, then
/// renames it over `target`. The temporary file is removed on every error
/// path.
fn write_atomic(target: &Path, data: &[u8], mode: u32) -> anyhow::Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", target.display()))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)?;
    debug!(tmp_path = %tmp.path().display(), "writing to temporary file");

    tmp.write_all(data)?;
    tmp.as_file()
        .set_permissions(std::fs::Permissions::from_mode(mode))?;
    tmp.persist(target).map_err(|err| err.error)?;
    Ok(())
}

// ============================================================================
// ILocalFileSystem implementation
// ============================================================================

#[async_trait::async_trait]
impl ILocalFileSystem for LocalFileSystemAdapter {
    #[instrument(skip(self), fields(path = %path))]
    async fn list_directory(&self, path: &SyncPath) -> anyhow::Result<Vec<LocalEntry>> {
        let mut dir = tokio::fs::read_dir(path.as_path())
            .await
            .with_context(|| format!("cannot open directory {path}"))?;

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            // DirEntry::metadata does not traverse symlinks.
            let meta = entry.metadata().await?;
            let name = entry
                .file_name()
                .into_string()
                .map_err(|raw| anyhow!("non UTF-8 file name {raw:?} in {path}"))?;
            if is_temp_name(&name) {
                debug!(%name, "skipping in-flight write");
                continue;
            }

            entries.push(LocalEntry {
                name,
                is_directory: meta.is_dir(),
                is_symlink: meta.file_type().is_symlink(),
                modified: Timestamp::from_system_time(meta.modified()?),
            });
        }

        entries.sort_by(LocalEntry::cmp_name);
        debug!(count = entries.len(), "directory listed");
        Ok(entries)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn read_file(&self, path: &SyncPath) -> anyhow::Result<Vec<u8>> {
        // Opening a FIFO blocks until a writer shows up.
        let meta = tokio::fs::symlink_metadata(path.as_path()).await?;
        if !meta.is_file() {
            bail!("{path} is not a regular file");
        }
        let data = tokio::fs::read(path.as_path()).await?;
        debug!(bytes = data.len(), "file read complete");
        Ok(data)
    }

    #[instrument(skip(self, data), fields(path = %path, bytes = data.len()))]
    async fn write_file(&self, path: &SyncPath, data: &[u8], mode: u32) -> anyhow::Result<()> {
        let target = path.as_path().to_path_buf();
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&target, &data, mode)).await??;

        debug!("write complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn create_directory(&self, path: &SyncPath, mode: u32) -> anyhow::Result<()> {
        tokio::fs::DirBuilder::new()
            .mode(mode)
            .create(path.as_path())
            .await?;
        debug!("directory created");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path, time = %time))]
    async fn set_mod_time(&self, path: &SyncPath, time: Timestamp) -> anyhow::Result<()> {
        let target = path.as_path().to_path_buf();
        let ft = FileTime::from_unix_time(time.as_unix(), 0);
        tokio::task::spawn_blocking(move || filetime::set_file_times(&target, ft, ft)).await??;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn mod_time(&self, path: &SyncPath) -> anyhow::Result<Timestamp> {
        let meta = tokio::fs::metadata(path.as_path()).await?;
        Ok(Timestamp::from_system_time(meta.modified()?))
    }
}
