//! Operator-facing sync events
//!
//! Every informational line the engine produces is a [`SyncEvent`]. The
//! `Display` impl is the line printed to the operator.

use serde::Serialize;

use super::newtypes::{RelPath, RemotePath};

/// One informational event emitted during a sync run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", content = "path", rename_all = "snake_case")]
pub enum SyncEvent {
    /// Remote content is being copied down
    Pull(RelPath),
    /// Local content is being copied up
    Push(RelPath),
    /// Remote file exceeds the block threshold
    SkipBig(RelPath),
    /// Local-only file predates the last completed sync
    SkipOld(RelPath),
    /// Remote symbolic links are never materialized locally
    IgnoreRemoteLink(RelPath),
    /// Remote entry exists but cannot be read
    SkipUnreadable(RelPath),
    /// A directory was created on the remote side
    RemoteMkdir(RemotePath),
    /// A directory was created on the local side
    LocalMkdir(RelPath),
    /// An empty, mode-0 marker was written for an unreadable remote entry
    Placeholder(RelPath),
}

impl std::fmt::Display for SyncEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncEvent::Pull(path) => write!(f, "pull {}", path),
            SyncEvent::Push(path) => write!(f, "push {}", path),
            SyncEvent::SkipBig(path) => write!(f, "skipping big {}", path),
            SyncEvent::SkipOld(path) => write!(f, "skipping old {}", path),
            SyncEvent::IgnoreRemoteLink(path) => write!(f, "ignoring remote link {}", path),
            SyncEvent::SkipUnreadable(path) => write!(f, "skipping unreadable {}", path),
            // Neutral on purpose: the line does not name the store backend.
            SyncEvent::RemoteMkdir(path) => write!(f, "remote mkdir {}", path),
            SyncEvent::LocalMkdir(path) => write!(f, "mkdir {}", path),
            SyncEvent::Placeholder(path) => write!(f, "placeholder {}", path),
        }
    }
}
