//! upsync Store - Remote directory adapters
//!
//! Provides two implementations of the
//! [`IRemoteDirectory`](upsync_core::ports::IRemoteDirectory) port:
//!
//! - [`DirectoryStore`] keeps every user's tree under one local directory,
//!   which stands in for a real remote store (an NFS mount, a synced volume).
//! - [`MemoryStore`] keeps the tree in memory and can be seeded with entry
//!   kinds a real filesystem cannot easily produce.
//!
//! ## Modules
//!
//! - [`directory`] - Directory-backed store
//! - [`memory`] - In-memory store

pub mod directory;
pub mod memory;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;

use thiserror::Error;

/// Errors raised by the store adapters
///
/// These travel through the port as `anyhow::Error` and can be recovered
/// with `downcast_ref::<StoreError>()`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No entry exists at the path
    #[error("not found: {0}")]
    NotFound(String),

    /// The path names something other than a directory
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// The path names a directory where a file was expected
    #[error("is a directory: {0}")]
    IsADirectory(String),

    /// An entry already exists at the path
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The entry exists but its contents cannot be read
    #[error("unreadable: {0}")]
    Unreadable(String),
}

/// Number of storage blocks needed for `len` bytes
pub(crate) fn blocks_for(len: u64, block_size: u64) -> u64 {
    if block_size == 0 {
        return 0;
    }
    len.div_ceil(block_size)
}
