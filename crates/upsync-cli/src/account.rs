//! Remote root inference from the working directory
//!
//! upsync is run from inside the local copy of a user's tree. The path
//! component that contains the first `@` is the user name, and everything
//! from there on is the remote path:
//!
//! ```text
//! /home/me/sync/alice@example.com/docs  ->  /alice@example.com/docs
//! ```

use thiserror::Error;

use upsync_core::domain::{DomainError, RemotePath, UserName};

/// Why the working directory does not name a remote tree
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountError {
    /// No `@` anywhere in the path
    #[error("working directory {0} does not contain a user name (no '@')")]
    NoUserName(String),

    /// The `@` is not preceded by a path separator
    #[error("working directory {0} has no separator before the user name")]
    NoSeparator(String),

    /// The derived path is not a valid remote path
    #[error(transparent)]
    Invalid(#[from] DomainError),
}

/// Derives the remote root for a working directory
///
/// Backslash separators are accepted and normalized to `/`.
///
/// # Errors
/// Returns [`AccountError`] if the path holds no `@`, no separator precedes
/// it, or the result is not a valid remote path under a valid user name
pub fn remote_root_for(working_dir: &str) -> Result<RemotePath, AccountError> {
    let at = working_dir
        .find('@')
        .ok_or_else(|| AccountError::NoUserName(working_dir.to_string()))?;

    let separator = working_dir[..at]
        .rfind(['/', '\\'])
        .ok_or_else(|| AccountError::NoSeparator(working_dir.to_string()))?;

    let tail = working_dir[separator + 1..].replace('\\', "/");
    let remote = RemotePath::new(format!("/{tail}"))?;

    // The first component must be a well-formed user name.
    if let Some(user) = remote.components().next() {
        UserName::new(user.to_string())?;
    }

    Ok(remote)
}
