//! SyncSession domain entity
//!
//! A SyncSession holds the fixed parameters of one sync run: where the two
//! trees live and the staleness threshold captured before traversal began.

use super::newtypes::{RelPath, RemotePath, SyncPath, Timestamp};

/// Parameters of a single sync run
///
/// `last_sync` is the modification time of the local root as it was before
/// this run started, which is when the previous successful run finished.
/// It is read-only for the life of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSession {
    remote_root: RemotePath,
    local_root: SyncPath,
    last_sync: Timestamp,
}

impl SyncSession {
    /// Creates a new session
    pub fn new(remote_root: RemotePath, local_root: SyncPath, last_sync: Timestamp) -> Self {
        Self {
            remote_root,
            local_root,
            last_sync,
        }
    }

    /// Remote directory that corresponds to the local root
    pub fn remote_root(&self) -> &RemotePath {
        &self.remote_root
    }

    /// Local directory being synchronized
    pub fn local_root(&self) -> &SyncPath {
        &self.local_root
    }

    /// Staleness threshold for one-sided local files
    pub fn last_sync(&self) -> Timestamp {
        self.last_sync
    }

    /// Returns true if a local file with this mtime predates the last sync
    pub fn is_stale(&self, modified: Timestamp) -> bool {
        modified < self.last_sync
    }

    /// Remote path of a root-relative entry
    pub fn remote_path(&self, rel: &RelPath) -> RemotePath {
        self.remote_root.join_rel(rel)
    }

    /// Local path of a root-relative entry
    pub fn local_path(&self, rel: &RelPath) -> SyncPath {
        self.local_root.join_rel(rel)
    }
}
