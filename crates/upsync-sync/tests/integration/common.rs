//! Shared fixture for engine integration tests
//!
//! A [`Fixture`] owns a temporary local root, an in-memory remote store with
//! the user root `/ann@example.com` already created, and a collecting
//! reporter.
//!
//! Creating anything inside the local root bumps the root's modification
//! time, which is the engine's notion of the previous run. Tests that care
//! about the staleness guard call [`Fixture::set_last_sync`] after laying
//! out their local files.

use std::path::PathBuf;
use std::sync::Arc;

use filetime::FileTime;
use tempfile::TempDir;

use upsync_core::domain::newtypes::{RemotePath, SyncPath, Timestamp};
use upsync_core::ports::progress::CollectingReporter;
use upsync_store::MemoryStore;
use upsync_sync::engine::{SyncEngine, SyncPolicy, SyncReport};
use upsync_sync::filesystem::LocalFileSystemAdapter;
use upsync_sync::SyncError;

pub const USER_ROOT: &str = "/ann@example.com";

pub struct Fixture {
    pub dir: TempDir,
    pub store: Arc<MemoryStore>,
    pub reporter: Arc<CollectingReporter>,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_store(MemoryStore::new()).await
    }

    pub async fn with_store(store: MemoryStore) -> Self {
        store.seed_directory(&remote_root()).await.unwrap();
        Self {
            dir: TempDir::new().unwrap(),
            store: Arc::new(store),
            reporter: Arc::new(CollectingReporter::new()),
        }
    }

    pub fn engine(&self) -> SyncEngine {
        SyncEngine::with_policy(
            self.store.clone(),
            Arc::new(LocalFileSystemAdapter::new()),
            self.reporter.clone(),
            SyncPolicy::default(),
        )
    }

    pub fn local_root(&self) -> SyncPath {
        SyncPath::new(self.dir.path().to_path_buf()).unwrap()
    }

    /// Runs one full sync with a fresh session
    pub async fn sync(&self) -> Result<SyncReport, SyncError> {
        let engine = self.engine();
        let session = engine
            .begin_session(remote_root(), self.local_root())
            .await?;
        engine.run(&session).await
    }

    // ------------------------------------------------------------------
    // Local side
    // ------------------------------------------------------------------

    pub fn local(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    pub fn write_local(&self, rel: &str, data: &[u8], mtime: i64) {
        let path = self.local(rel);
        std::fs::write(&path, data).unwrap();
        let ft = FileTime::from_unix_time(mtime, 0);
        filetime::set_file_times(&path, ft, ft).unwrap();
    }

    pub fn mkdir_local(&self, rel: &str) {
        std::fs::create_dir(self.local(rel)).unwrap();
    }

    pub fn local_mtime(&self, rel: &str) -> i64 {
        let meta = std::fs::symlink_metadata(self.local(rel)).unwrap();
        FileTime::from_last_modification_time(&meta).unix_seconds()
    }

    pub fn set_last_sync(&self, secs: i64) {
        let ft = FileTime::from_unix_time(secs, 0);
        filetime::set_file_times(self.dir.path(), ft, ft).unwrap();
    }

    pub fn last_sync(&self) -> i64 {
        let meta = std::fs::metadata(self.dir.path()).unwrap();
        FileTime::from_last_modification_time(&meta).unix_seconds()
    }

    // ------------------------------------------------------------------
    // Remote side
    // ------------------------------------------------------------------

    pub async fn seed_remote(&self, rel: &str, data: &[u8], mtime: i64) {
        self.store
            .seed_file(&rp(rel), data, Timestamp::from_unix(mtime))
            .await
            .unwrap();
    }

    pub async fn remote_mtime(&self, rel: &str) -> Option<i64> {
        self.store
            .entry(&rp(rel))
            .await
            .map(|entry| entry.modified.as_unix())
    }

    pub fn lines(&self) -> Vec<String> {
        self.reporter.lines()
    }
}

pub fn remote_root() -> RemotePath {
    USER_ROOT.parse().unwrap()
}

/// Remote path of `rel` below the user root
pub fn rp(rel: &str) -> RemotePath {
    format!("{USER_ROOT}/{rel}").parse().unwrap()
}
