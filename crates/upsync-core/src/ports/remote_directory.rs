//! Remote directory port (driven/secondary port)
//!
//! This module defines the interface to the remote, versioned store. The
//! store is addressed by [`RemotePath`]; the first path component is the
//! owning user.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because errors at port boundaries are adapter-specific
//!   and don't need domain-level classification.
//! - `write` lets the store assign a fresh modification time. Callers that
//!   need a specific time follow up with `set_mod_time`.

use crate::domain::entry::DirEntry;
use crate::domain::newtypes::{RemotePath, Timestamp};

/// Port trait for remote store operations
///
/// ## Implementation Notes
///
/// - `list` returns the direct children of a directory. Entry names are the
///   final path component. Implementations should return them sorted by name,
///   but the engine does not rely on it.
/// - Reading an entry of kind `Incomplete` is expected to fail.
/// - `create_directory` and `write` require the parent directory to exist.
#[async_trait::async_trait]
pub trait IRemoteDirectory: Send + Sync {
    /// Lists the direct children of a directory
    ///
    /// # Errors
    /// Returns an error if the path is missing, not a directory, or the
    /// transport fails
    async fn list(&self, path: &RemotePath) -> anyhow::Result<Vec<DirEntry>>;

    /// Reads the entire contents of a file
    async fn read(&self, path: &RemotePath) -> anyhow::Result<Vec<u8>>;

    /// Creates or replaces a file with `data`
    async fn write(&self, path: &RemotePath, data: &[u8]) -> anyhow::Result<()>;

    /// Overrides the stored modification time of an entry
    async fn set_mod_time(&self, path: &RemotePath, time: Timestamp) -> anyhow::Result<()>;

    /// Creates a single directory
    async fn create_directory(&self, path: &RemotePath) -> anyhow::Result<()>;
}
