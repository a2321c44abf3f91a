//! Recursive merge synchronization engine
//!
//! The [`SyncEngine`] walks the remote and local trees in lockstep, one
//! directory at a time, and reconciles every name it finds.
//!
//! ## Sync Flow
//!
//! 1. **Session**: The local root's modification time is captured as the
//!    time of the previous successful run ([`SyncEngine::begin_session`]).
//! 2. **Merge**: Both listings of a directory are sorted by name and merged
//!    with two cursors. Each step is one of remote-only, local-only or
//!    both-present, and subdirectories are descended depth-first.
//! 3. **Bookkeeping**: After a clean run the local root's modification time
//!    is reset to now, and a [`SyncReport`] is returned.
//!
//! ## Transfer Rules
//!
//! - Whichever side has the strictly later timestamp wins. Equal timestamps
//!   are left alone.
//! - A local file older than the previous run is never pushed. Without a
//!   deletion log it cannot be told apart from a file deleted remotely.
//! - Remote-only files above the block threshold are skipped, remote links
//!   are ignored, and remote entries that cannot be read leave a zero-length
//!   placeholder behind.
//!
//! A kind conflict (directory on one side, file on the other) or any local
//! symbolic link aborts the whole run.

use std::cmp::Ordering;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use upsync_core::config::{Config, SyncConfig, DEFAULT_MAX_BLOCKS};
use upsync_core::domain::entry::{DirEntry, EntryKind, LocalEntry};
use upsync_core::domain::event::SyncEvent;
use upsync_core::domain::newtypes::{RelPath, RemotePath, SyncPath, Timestamp};
use upsync_core::domain::session::SyncSession;
use upsync_core::ports::local_filesystem::ILocalFileSystem;
use upsync_core::ports::progress::IProgressReporter;
use upsync_core::ports::remote_directory::IRemoteDirectory;

use crate::transfer;
use crate::SyncError;

type SyncFuture<'a> = Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + 'a>>;

// ============================================================================
// SyncPolicy
// ============================================================================

/// Tunables that shape what the merge transfers and how it writes locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPolicy {
    /// Remote-only files with more blocks than this are skipped
    pub max_blocks: u64,
    /// Permission bits for pulled files
    pub file_mode: u32,
    /// Permission bits for directories created locally
    pub dir_mode: u32,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            max_blocks: DEFAULT_MAX_BLOCKS,
            file_mode: 0o600,
            dir_mode: 0o700,
        }
    }
}

impl From<&SyncConfig> for SyncPolicy {
    fn from(config: &SyncConfig) -> Self {
        Self {
            max_blocks: config.max_blocks,
            file_mode: config.file_mode,
            dir_mode: config.dir_mode,
        }
    }
}

// ============================================================================
// SyncReport
// ============================================================================

/// Summary of a completed sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Files copied from the remote store
    pub files_pulled: u32,
    /// Files copied to the remote store
    pub files_pushed: u32,
    /// Directories created locally
    pub local_dirs_created: u32,
    /// Directories created in the remote store
    pub remote_dirs_created: u32,
    /// Zero-length placeholders left for unreadable remote files
    pub placeholders_created: u32,
    /// Remote-only files skipped for size
    pub skipped_big: u32,
    /// Local files not pushed because they predate the previous run
    pub skipped_old: u32,
    /// Remote symbolic links ignored
    pub ignored_links: u32,
    /// Remote entries present on both sides that could not be read
    pub skipped_unreadable: u32,
    /// Wall-clock duration of the run in milliseconds
    pub duration_ms: u64,
}

impl SyncReport {
    /// Total number of file transfers in either direction
    pub fn transfers(&self) -> u32 {
        self.files_pulled + self.files_pushed
    }

    /// Total number of entries deliberately left untouched
    pub fn skipped(&self) -> u32 {
        self.skipped_big + self.skipped_old + self.ignored_links + self.skipped_unreadable
    }

    fn record(&mut self, event: &SyncEvent) {
        let counter = match event {
            SyncEvent::Pull(_) => &mut self.files_pulled,
            SyncEvent::Push(_) => &mut self.files_pushed,
            SyncEvent::LocalMkdir(_) => &mut self.local_dirs_created,
            SyncEvent::RemoteMkdir(_) => &mut self.remote_dirs_created,
            SyncEvent::Placeholder(_) => &mut self.placeholders_created,
            SyncEvent::SkipBig(_) => &mut self.skipped_big,
            SyncEvent::SkipOld(_) => &mut self.skipped_old,
            SyncEvent::IgnoreRemoteLink(_) => &mut self.ignored_links,
            SyncEvent::SkipUnreadable(_) => &mut self.skipped_unreadable,
        };
        *counter += 1;
    }
}

// ============================================================================
// Merge step classification
// ============================================================================

/// What the merge cursor points at
#[derive(Debug, PartialEq, Eq)]
enum Step<'a> {
    /// Both listings are exhausted
    Done,
    /// The next name exists only remotely
    RemoteOnly(&'a DirEntry),
    /// The next name exists only locally
    LocalOnly(&'a LocalEntry),
    /// The next name exists on both sides
    BothPresent(&'a DirEntry, &'a LocalEntry),
}

/// Classifies the entries at cursors `i` (remote) and `j` (local)
///
/// Both slices must be sorted by name.
fn classify<'a>(remote: &'a [DirEntry], local: &'a [LocalEntry], i: usize, j: usize) -> Step<'a> {
    match (remote.get(i), local.get(j)) {
        (None, None) => Step::Done,
        (Some(r), None) => Step::RemoteOnly(r),
        (None, Some(l)) => Step::LocalOnly(l),
        (Some(r), Some(l)) => match r.name.as_bytes().cmp(l.name.as_bytes()) {
            Ordering::Less => Step::RemoteOnly(r),
            Ordering::Greater => Step::LocalOnly(l),
            Ordering::Equal => Step::BothPresent(r, l),
        },
    }
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Two-way, latest-wins synchronization of one remote tree with one local tree
pub struct SyncEngine {
    remote: Arc<dyn IRemoteDirectory>,
    local: Arc<dyn ILocalFileSystem>,
    reporter: Arc<dyn IProgressReporter>,
    policy: SyncPolicy,
}

impl SyncEngine {
    /// Creates an engine using the merge settings from `config`
    pub fn new(
        remote: Arc<dyn IRemoteDirectory>,
        local: Arc<dyn ILocalFileSystem>,
        reporter: Arc<dyn IProgressReporter>,
        config: &Config,
    ) -> Self {
        Self::with_policy(remote, local, reporter, SyncPolicy::from(&config.sync))
    }

    /// Creates an engine with an explicit policy
    pub fn with_policy(
        remote: Arc<dyn IRemoteDirectory>,
        local: Arc<dyn ILocalFileSystem>,
        reporter: Arc<dyn IProgressReporter>,
        policy: SyncPolicy,
    ) -> Self {
        Self {
            remote,
            local,
            reporter,
            policy,
        }
    }

    /// Captures the session for a run rooted at the given pair of directories
    ///
    /// The previous-run time is the current modification time of the local
    /// root.
    ///
    /// # Errors
    /// Returns [`SyncError::Local`] if the local root cannot be stat'ed
    pub async fn begin_session(
        &self,
        remote_root: RemotePath,
        local_root: SyncPath,
    ) -> Result<SyncSession, SyncError> {
        let last_sync = self
            .local
            .mod_time(&local_root)
            .await
            .map_err(SyncError::local("stat", &local_root))?;

        debug!(%remote_root, %local_root, %last_sync, "Session captured");
        Ok(SyncSession::new(remote_root, local_root, last_sync))
    }

    /// Runs one full synchronization pass
    ///
    /// On success the local root's modification time is reset to now so the
    /// next run treats everything older as already seen. Failing to reset it
    /// is logged but does not fail the run.
    ///
    /// # Errors
    /// Returns the first fatal [`SyncError`]; the root time is then left
    /// untouched.
    #[instrument(skip(self, session), fields(remote_root = %session.remote_root(), local_root = %session.local_root()))]
    pub async fn run(&self, session: &SyncSession) -> Result<SyncReport, SyncError> {
        let start = std::time::Instant::now();
        let mut report = SyncReport::default();

        info!(last_sync = %session.last_sync(), "Starting sync run");

        self.sync_dir(session, RelPath::root(), &mut report).await?;

        if let Err(err) = self
            .local
            .set_mod_time(session.local_root(), Timestamp::now())
            .await
        {
            warn!(error = %err, "Failed to reset local root modification time");
        }

        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            pulled = report.files_pulled,
            pushed = report.files_pushed,
            skipped = report.skipped(),
            duration_ms = report.duration_ms,
            "Sync run completed"
        );

        Ok(report)
    }

    /// Merges one directory level and recurses into subdirectories
    fn sync_dir<'a>(
        &'a self,
        session: &'a SyncSession,
        rel: RelPath,
        report: &'a mut SyncReport,
    ) -> SyncFuture<'a> {
        Box::pin(async move {
            let remote_dir = session.remote_path(&rel);
            let local_dir = session.local_path(&rel);
            debug!(path = %rel, "Merging directory");

            let mut remote_entries = self
                .remote
                .list(&remote_dir)
                .await
                .map_err(SyncError::remote("list", &remote_dir))?;
            let mut local_entries = self
                .local
                .list_directory(&local_dir)
                .await
                .map_err(SyncError::local("list", &local_dir))?;

            // Refuse the whole level before touching anything in it.
            if let Some(link) = local_entries.iter().find(|e| e.is_symlink) {
                return Err(SyncError::LocalSymlink {
                    path: rel.join(&link.name)?,
                });
            }

            remote_entries.sort_by(DirEntry::cmp_name);
            local_entries.sort_by(LocalEntry::cmp_name);

            let (mut i, mut j) = (0, 0);
            loop {
                match classify(&remote_entries, &local_entries, i, j) {
                    Step::Done => break,
                    Step::RemoteOnly(r) => {
                        self.remote_only(session, &rel, r, report).await?;
                        i += 1;
                    }
                    Step::LocalOnly(l) => {
                        self.local_only(session, &rel, l, report).await?;
                        j += 1;
                    }
                    Step::BothPresent(r, l) => {
                        self.both_present(session, &rel, r, l, report).await?;
                        i += 1;
                        j += 1;
                    }
                }
            }

            Ok(())
        })
    }

    async fn remote_only(
        &self,
        session: &SyncSession,
        parent: &RelPath,
        entry: &DirEntry,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let path = parent.join(&entry.name)?;

        match entry.kind {
            EntryKind::Directory => {
                let local_path = session.local_path(&path);
                self.local
                    .create_directory(&local_path, self.policy.dir_mode)
                    .await
                    .map_err(SyncError::local("mkdir", &local_path))?;
                self.emit(SyncEvent::LocalMkdir(path.clone()), report);
                self.sync_dir(session, path, report).await
            }
            EntryKind::SymbolicLink => {
                self.emit(SyncEvent::IgnoreRemoteLink(path), report);
                Ok(())
            }
            EntryKind::Incomplete => {
                let local_path = session.local_path(&path);
                self.local
                    .write_file(&local_path, &[], 0)
                    .await
                    .map_err(SyncError::local("write", &local_path))?;
                self.emit(SyncEvent::Placeholder(path), report);
                Ok(())
            }
            EntryKind::File if entry.blocks > self.policy.max_blocks => {
                self.emit(SyncEvent::SkipBig(path), report);
                Ok(())
            }
            EntryKind::File => self.pull(session, path, entry.modified, report).await,
        }
    }

    async fn local_only(
        &self,
        session: &SyncSession,
        parent: &RelPath,
        entry: &LocalEntry,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let path = parent.join(&entry.name)?;

        if entry.is_directory {
            let remote_path = session.remote_path(&path);
            self.emit(SyncEvent::RemoteMkdir(remote_path.clone()), report);
            self.remote
                .create_directory(&remote_path)
                .await
                .map_err(SyncError::remote("mkdir", &remote_path))?;
            return self.sync_dir(session, path, report).await;
        }

        self.push(session, path, entry.modified, report).await
    }

    async fn both_present(
        &self,
        session: &SyncSession,
        parent: &RelPath,
        remote: &DirEntry,
        local: &LocalEntry,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let path = parent.join(&local.name)?;

        if remote.is_directory() != local.is_directory {
            return Err(SyncError::KindConflict { path });
        }
        if local.is_directory {
            return self.sync_dir(session, path, report).await;
        }

        match remote.kind {
            EntryKind::SymbolicLink => {
                self.emit(SyncEvent::IgnoreRemoteLink(path), report);
                Ok(())
            }
            EntryKind::Incomplete => {
                self.emit(SyncEvent::SkipUnreadable(path), report);
                Ok(())
            }
            _ => match remote.modified.cmp(&local.modified) {
                Ordering::Greater => self.pull(session, path, remote.modified, report).await,
                Ordering::Less => self.push(session, path, local.modified, report).await,
                Ordering::Equal => {
                    debug!(%path, modified = %local.modified, "In sync");
                    Ok(())
                }
            },
        }
    }

    async fn pull(
        &self,
        session: &SyncSession,
        path: RelPath,
        modified: Timestamp,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let from = session.remote_path(&path);
        let to = session.local_path(&path);
        self.emit(SyncEvent::Pull(path), report);
        transfer::pull(
            self.remote.as_ref(),
            self.local.as_ref(),
            &from,
            &to,
            modified,
            self.policy.file_mode,
        )
        .await
    }

    /// Pushes unless the local file predates the previous run
    async fn push(
        &self,
        session: &SyncSession,
        path: RelPath,
        modified: Timestamp,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        if session.is_stale(modified) {
            self.emit(SyncEvent::SkipOld(path), report);
            return Ok(());
        }

        let from = session.local_path(&path);
        let to = session.remote_path(&path);
        self.emit(SyncEvent::Push(path), report);
        transfer::push(
            self.remote.as_ref(),
            self.local.as_ref(),
            &from,
            &to,
            modified,
        )
        .await
    }

    fn emit(&self, event: SyncEvent, report: &mut SyncReport) {
        debug!(%event, "sync event");
        report.record(&event);
        self.reporter.report(&event);
    }
}
