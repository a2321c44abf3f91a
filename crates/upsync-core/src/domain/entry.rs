//! Directory listing entries
//!
//! [`DirEntry`] is one row of a remote listing and [`LocalEntry`] one row of a
//! local listing. Both carry only what the merge needs: the name used as the
//! sort key, the entry kind, and the modification time.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::newtypes::Timestamp;

/// Prefix of the temporary file a write goes through before its rename
pub const TEMP_PREFIX: &str = ".upsync-";

/// Suffix of the temporary file a write goes through before its rename
pub const TEMP_SUFFIX: &str = ".tmp";

/// Returns true for names reserved for in-flight writes
///
/// Both listings drop these names, so a write cut short by a crash is never
/// synced as a user file.
pub fn is_temp_name(name: &str) -> bool {
    name.len() > TEMP_PREFIX.len() + TEMP_SUFFIX.len()
        && name.starts_with(TEMP_PREFIX)
        && name.ends_with(TEMP_SUFFIX)
}

/// Kind of a remote entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Directory,
    File,
    SymbolicLink,
    /// Present remotely, but the caller lacks permission to read it
    Incomplete,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntryKind::Directory => "directory",
            EntryKind::File => "file",
            EntryKind::SymbolicLink => "link",
            EntryKind::Incomplete => "incomplete",
        };
        write!(f, "{}", s)
    }
}

/// A single entry of a remote directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Final path component (relative to the listed directory)
    pub name: String,
    pub kind: EntryKind,
    /// Size in storage blocks
    pub blocks: u64,
    /// Stored modification time
    pub modified: Timestamp,
}

impl DirEntry {
    /// Creates a directory entry
    pub fn directory(name: impl Into<String>, modified: Timestamp) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            blocks: 0,
            modified,
        }
    }

    /// Creates a regular file entry
    pub fn file(name: impl Into<String>, blocks: u64, modified: Timestamp) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            blocks,
            modified,
        }
    }

    /// Returns true if this entry is a directory
    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Bytewise ordering by name, the merge key
    pub fn cmp_name(&self, other: &Self) -> Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}

/// A single entry of a local directory listing
///
/// Produced from `lstat`, so a symbolic link is reported as such rather than
/// as whatever it points to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    /// File name within the listed directory
    pub name: String,
    pub is_directory: bool,
    pub is_symlink: bool,
    /// Modification time, truncated to whole seconds
    pub modified: Timestamp,
}

impl LocalEntry {
    /// Creates a regular file entry
    pub fn file(name: impl Into<String>, modified: Timestamp) -> Self {
        Self {
            name: name.into(),
            is_directory: false,
            is_symlink: false,
            modified,
        }
    }

    /// Creates a directory entry
    pub fn directory(name: impl Into<String>, modified: Timestamp) -> Self {
        Self {
            name: name.into(),
            is_directory: true,
            is_symlink: false,
            modified,
        }
    }

    /// Bytewise ordering by name, the merge key
    pub fn cmp_name(&self, other: &Self) -> Ordering {
        self.name.as_bytes().cmp(other.name.as_bytes())
    }
}
