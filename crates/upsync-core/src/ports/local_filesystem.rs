//! Local filesystem port (driven/secondary port)
//!
//! This module defines the interface for interacting with the local
//! filesystem: listing directories with lstat metadata, whole-file reads and
//! writes, directory creation and explicit modification times.
//!
//! ## Design Notes
//!
//! - Uses `anyhow::Result` because filesystem errors are adapter-specific.
//! - `list_directory` must not follow symbolic links; the engine refuses to
//!   sync a tree that contains one and needs to see them.
//! - Listings need not be sorted; the engine sorts them itself.

use crate::domain::entry::LocalEntry;
use crate::domain::newtypes::{SyncPath, Timestamp};

/// Port trait for local filesystem operations
///
/// All paths are `SyncPath` instances, which are guaranteed to be absolute.
#[async_trait::async_trait]
pub trait ILocalFileSystem: Send + Sync {
    /// Lists the entries of a directory (not including `.` and `..`)
    ///
    /// # Errors
    /// Returns an error if the directory doesn't exist or cannot be read
    async fn list_directory(&self, path: &SyncPath) -> anyhow::Result<Vec<LocalEntry>>;

    /// Reads the entire contents of a file
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be read
    async fn read_file(&self, path: &SyncPath) -> anyhow::Result<Vec<u8>>;

    /// Writes data to a file, replacing any existing content
    ///
    /// The file ends up with exactly the permission bits in `mode`.
    ///
    /// # Arguments
    /// * `path` - Absolute path to the file
    /// * `data` - The data to write
    /// * `mode` - Unix permission bits, e.g. `0o600`
    async fn write_file(&self, path: &SyncPath, data: &[u8], mode: u32) -> anyhow::Result<()>;

    /// Creates a single directory with the given permission bits
    ///
    /// The parent must already exist.
    async fn create_directory(&self, path: &SyncPath, mode: u32) -> anyhow::Result<()>;

    /// Sets the modification (and access) time of a file or directory
    async fn set_mod_time(&self, path: &SyncPath, time: Timestamp) -> anyhow::Result<()>;

    /// Returns the modification time of a file or directory
    async fn mod_time(&self, path: &SyncPath) -> anyhow::Result<Timestamp>;
}
