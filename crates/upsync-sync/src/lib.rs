//! upsync Sync - Recursive merge synchronization engine
//!
//! Provides:
//! - A depth-first sorted merge of remote and local directory listings
//! - Latest-timestamp-wins transfers in both directions
//! - A staleness guard that keeps old one-sided local files from being pushed
//!
//! ## Modules
//!
//! - [`engine`] - The merge engine and its per-run report
//! - [`transfer`] - Pull and push leaf operations
//! - [`filesystem`] - Local filesystem adapter (atomic writes, lstat listings)

pub mod engine;
pub mod filesystem;
pub mod transfer;

use thiserror::Error;
use upsync_core::domain::{DomainError, RelPath, RemotePath, SyncPath};

/// Errors that abort a sync run
///
/// Every variant is fatal: the run stops at the first one and leaves both
/// trees in whatever state they reached.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The same name is a directory on one side and a file on the other
    #[error("same name, different directory attribute: {path}")]
    KindConflict { path: RelPath },

    /// A symbolic link was found in the local tree
    #[error("local symlink not allowed: {path}")]
    LocalSymlink { path: RelPath },

    /// A remote store operation failed
    #[error("remote {op} failed for {path}")]
    Remote {
        op: &'static str,
        path: RemotePath,
        #[source]
        source: anyhow::Error,
    },

    /// A local filesystem operation failed
    #[error("local {op} failed for {path}")]
    Local {
        op: &'static str,
        path: SyncPath,
        #[source]
        source: anyhow::Error,
    },

    /// A domain-level error propagated from upsync-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl SyncError {
    /// Returns true for structural conflicts as opposed to I/O failures
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            SyncError::KindConflict { .. } | SyncError::LocalSymlink { .. }
        )
    }

    pub(crate) fn remote(op: &'static str, path: &RemotePath) -> impl FnOnce(anyhow::Error) -> Self {
        let path = path.clone();
        move |source| SyncError::Remote { op, path, source }
    }

    pub(crate) fn local(op: &'static str, path: &SyncPath) -> impl FnOnce(anyhow::Error) -> Self {
        let path = path.clone();
        move |source| SyncError::Local { op, path, source }
    }
}
