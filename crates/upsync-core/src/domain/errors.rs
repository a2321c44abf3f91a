//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly path and name validation failures.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid local path format or content
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid remote path format
    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// A single name component is empty, `.`/`..`, or contains a separator
    #[error("Invalid path component: {0}")]
    InvalidComponent(String),

    /// Invalid user name (expected `local@domain`)
    #[error("Invalid user name: {0}")]
    InvalidUserName(String),

}
