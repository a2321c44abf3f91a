//! DirectoryStore - IRemoteDirectory implementation over a local directory
//!
//! The remote path `/ann@example.com/a/b` maps to `<root>/ann@example.com/a/b`.
//!
//! ## Design Notes
//!
//! - Entries are classified with `symlink_metadata`, so links in the store
//!   are reported as links and never followed.
//! - A regular file the process cannot open for reading is reported as
//!   `Incomplete`, the same way a remote store reports an entry whose blocks
//!   it cannot fetch. FIFOs, sockets and device nodes are never opened and
//!   are reported as `Incomplete` too.
//! - Writes go through a uniquely named temporary file and a rename, and pick
//!   up the current time. Callers that need a specific time follow up with
//!   `set_mod_time`.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use filetime::FileTime;
use tracing::{debug, instrument, warn};

use upsync_core::config::StoreConfig;
use upsync_core::domain::entry::{is_temp_name, DirEntry, EntryKind, TEMP_PREFIX, TEMP_SUFFIX};
use upsync_core::domain::newtypes::{RemotePath, Timestamp};
use upsync_core::ports::remote_directory::IRemoteDirectory;

use crate::{blocks_for, StoreError};

/// Remote store backed by a directory tree
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
    block_size: u64,
}

impl DirectoryStore {
    /// Creates a store rooted at `root`
    pub fn new(root: impl Into<PathBuf>, block_size: u64) -> Self {
        Self {
            root: root.into(),
            block_size,
        }
    }

    /// Creates a store from the `store` config section
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.resolved_root(), config.block_size)
    }

    /// Directory holding every user's tree
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Maps a remote path to its location under the store root
    pub fn resolve(&self, path: &RemotePath) -> PathBuf {
        let mut resolved = self.root.clone();
        for component in path.components() {
            resolved.push(component);
        }
        resolved
    }

    async fn classify(&self, path: &Path, meta: &std::fs::Metadata) -> (EntryKind, u64) {
        let file_type = meta.file_type();
        if file_type.is_dir() {
            return (EntryKind::Directory, 0);
        }
        if file_type.is_symlink() {
            return (EntryKind::SymbolicLink, 0);
        }
        if !file_type.is_file() {
            // Opening a FIFO blocks until a writer shows up.
            warn!(path = %path.display(), "special file in store, reporting as incomplete");
            return (EntryKind::Incomplete, 0);
        }
        match tokio::fs::File::open(path).await {
            Ok(_) => (EntryKind::File, blocks_for(meta.len(), self.block_size)),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "entry not readable");
                (EntryKind::Incomplete, 0)
            }
        }
    }
}

#[async_trait::async_trait]
impl IRemoteDirectory for DirectoryStore {
    #[instrument(skip(self), fields(path = %path))]
    async fn list(&self, path: &RemotePath) -> Result<Vec<DirEntry>> {
        let dir = self.resolve(path);
        let mut reader = match tokio::fs::read_dir(&dir).await {
            Ok(reader) => reader,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path.to_string()).into())
            }
            Err(err) => {
                return Err(err).with_context(|| format!("cannot list {}", dir.display()))
            }
        };

        let mut entries = Vec::new();
        while let Some(entry) = reader.next_entry().await? {
            let Ok(name) = entry.file_name().into_string() else {
                warn!(raw = ?entry.file_name(), "skipping non UTF-8 store entry");
                continue;
            };
            if is_temp_name(&name) {
                debug!(%name, "skipping in-flight write");
                continue;
            }

            let meta = entry.metadata().await?;
            let (kind, blocks) = self.classify(&entry.path(), &meta).await;
            entries.push(DirEntry {
                name,
                kind,
                blocks,
                modified: Timestamp::from_system_time(meta.modified()?),
            });
        }

        entries.sort_by(DirEntry::cmp_name);
        debug!(count = entries.len(), "store directory listed");
        Ok(entries)
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn read(&self, path: &RemotePath) -> Result<Vec<u8>> {
        let file = self.resolve(path);
        let data = tokio::fs::read(&file)
            .await
            .map_err(|err| match err.kind() {
                ErrorKind::NotFound => StoreError::NotFound(path.to_string()),
                _ => StoreError::Unreadable(path.to_string()),
            })?;
        debug!(bytes = data.len(), "store file read");
        Ok(data)
    }

    #[instrument(skip(self, data), fields(path = %path, bytes = data.len()))]
    async fn write(&self, path: &RemotePath, data: &[u8]) -> Result<()> {
        let target = self.resolve(path);
        let data = data.to_vec();
        tokio::task::spawn_blocking(move || write_atomic(&target, &data))
            .await?
            .with_context(|| format!("cannot write {path}"))?;

        debug!("store write complete");
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path, time = %time))]
    async fn set_mod_time(&self, path: &RemotePath, time: Timestamp) -> Result<()> {
        let target = self.resolve(path);
        let ft = FileTime::from_unix_time(time.as_unix(), 0);
        tokio::task::spawn_blocking(move || filetime::set_file_times(&target, ft, ft))
            .await?
            .with_context(|| format!("cannot set time of {path}"))?;
        Ok(())
    }

    #[instrument(skip(self), fields(path = %path))]
    async fn create_directory(&self, path: &RemotePath) -> Result<()> {
        let dir = self.resolve(path);
        match tokio::fs::create_dir(&dir).await {
            Ok(()) => {
                debug!("store directory created");
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                Err(StoreError::AlreadyExists(path.to_string()).into())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                let parent = path.parent().unwrap_or_else(RemotePath::root);
                Err(StoreError::NotFound(parent.to_string()).into())
            }
            Err(err) => Err(err).with_context(|| format!("cannot create {path}")),
        }
    }
}

/// Writes `data` to a temporary sibling of `target`, then renames it over
/// `target`. The temporary file is removed on every error path.
fn write_atomic(target: &Path, data: &[u8]) -> Result<()> {
    let parent = target
        .parent()
        .ok_or_else(|| anyhow!("{} has no parent directory", target.display()))?;
    let mut tmp = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(TEMP_SUFFIX)
        .tempfile_in(parent)?;
    tmp.write_all(data)?;
    tmp.persist(target).map_err(|err| err.error)?;
    Ok(())
}
