//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for paths, names and times.
//! Each newtype ensures data validity at construction time, so the sync
//! engine never splices raw strings to build an identity.

use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::DomainError;

// ============================================================================
// Timestamp
// ============================================================================

/// A modification time in whole seconds since the Unix epoch
///
/// The remote store keeps whole seconds, so local times are truncated on the
/// way in. Comparing at finer resolution would make every pulled file look
/// newer locally on the next run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a Timestamp from seconds since the Unix epoch
    #[must_use]
    pub const fn from_unix(secs: i64) -> Self {
        Self(secs)
    }

    /// Seconds since the Unix epoch
    #[must_use]
    pub const fn as_unix(&self) -> i64 {
        self.0
    }

    /// The current wall-clock time
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now().timestamp())
    }

    /// Truncate a [`SystemTime`] to whole seconds (flooring pre-epoch times)
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Self {
        Self(DateTime::<Utc>::from(time).timestamp())
    }

    /// Convert to a chrono `DateTime`, if representable
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "@{}", self.0),
        }
    }
}

impl From<SystemTime> for Timestamp {
    fn from(time: SystemTime) -> Self {
        Self::from_system_time(time)
    }
}

// ============================================================================
// RelPath
// ============================================================================

/// Check that `name` is usable as a single path component on both sides
fn validate_component(name: &str) -> Result<(), DomainError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(DomainError::InvalidComponent(name.to_string()));
    }
    if name.contains('/') || name.contains('\0') {
        return Err(DomainError::InvalidComponent(name.to_string()));
    }
    Ok(())
}

/// A path relative to the synchronized root, held as validated components
///
/// The root itself is the empty path. Displays as `a/b/c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelPath(Vec<String>);

impl RelPath {
    /// The synchronized root
    #[must_use]
    pub fn root() -> Self {
        Self(Vec::new())
    }

    /// Append a single name component
    ///
    /// # Errors
    /// Returns `DomainError::InvalidComponent` if `name` is empty, `.`, `..`,
    /// or contains a separator
    pub fn join(&self, name: &str) -> Result<Self, DomainError> {
        validate_component(name)?;
        let mut components = self.0.clone();
        components.push(name.to_string());
        Ok(Self(components))
    }

    /// Iterate over the name components, outermost first
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for RelPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("/"))
    }
}

impl FromStr for RelPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }
        s.split('/')
            .try_fold(Self::root(), |path, name| path.join(name))
    }
}

impl TryFrom<String> for RelPath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<RelPath> for String {
    fn from(path: RelPath) -> Self {
        path.to_string()
    }
}

// ============================================================================
// SyncPath
// ============================================================================

/// A validated absolute local path
///
/// SyncPath ensures the path is:
/// - Absolute (starts with /)
/// - Normalized (no . or .. components)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PathBuf", into = "PathBuf")]
pub struct SyncPath(PathBuf);

impl SyncPath {
    /// Create a new SyncPath, validating it is absolute
    ///
    /// # Errors
    /// Returns `DomainError::InvalidPath` if the path is not absolute
    pub fn new(path: PathBuf) -> Result<Self, DomainError> {
        if !path.is_absolute() {
            return Err(DomainError::InvalidPath(format!(
                "Path must be absolute: {}",
                path.display()
            )));
        }

        // We don't use fs::canonicalize() as the path might not exist yet
        let normalized = Self::normalize_path(&path)?;
        Ok(Self(normalized))
    }

    /// Get the inner path reference
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Join a single validated name component
    ///
    /// # Errors
    /// Returns error if the component contains invalid sequences
    pub fn join(&self, component: &str) -> Result<Self, DomainError> {
        validate_component(component)?;
        Ok(Self(self.0.join(component)))
    }

    /// Resolve a root-relative path underneath this one
    #[must_use]
    pub fn join_rel(&self, rel: &RelPath) -> Self {
        // RelPath components are validated at construction, so pushing them
        // cannot escape or denormalize the path.
        let mut path = self.0.clone();
        for component in rel.components() {
            path.push(component);
        }
        Self(path)
    }

    /// Normalize a path by resolving . and .. components
    fn normalize_path(path: &Path) -> Result<PathBuf, DomainError> {
        use std::path::Component;

        let mut normalized = PathBuf::new();

        for component in path.components() {
            match component {
                Component::Prefix(p) => normalized.push(p.as_os_str()),
                Component::RootDir => normalized.push("/"),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(DomainError::InvalidPath(
                            "Path escapes root via ..".to_string(),
                        ));
                    }
                }
                Component::Normal(c) => normalized.push(c),
            }
        }

        Ok(normalized)
    }
}

impl Display for SyncPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

impl TryFrom<PathBuf> for SyncPath {
    type Error = DomainError;

    fn try_from(path: PathBuf) -> Result<Self, Self::Error> {
        Self::new(path)
    }
}

impl From<SyncPath> for PathBuf {
    fn from(sync_path: SyncPath) -> Self {
        sync_path.0
    }
}

impl AsRef<Path> for SyncPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

// ============================================================================
// RemotePath
// ============================================================================

/// A path in the remote store (must start with /)
///
/// The first component is the owning user, e.g. `/ann@example.com/docs/a.txt`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RemotePath(String);

impl RemotePath {
    /// Create a new RemotePath
    ///
    /// # Errors
    /// Returns error if the path doesn't start with `/`, has empty components,
    /// a trailing slash, or `.`/`..` components
    pub fn new(path: String) -> Result<Self, DomainError> {
        if !path.starts_with('/') {
            return Err(DomainError::InvalidRemotePath(format!(
                "Remote path must start with '/': {path}"
            )));
        }

        if path == "/" {
            return Ok(Self(path));
        }

        for component in path[1..].split('/') {
            if component.is_empty() {
                return Err(DomainError::InvalidRemotePath(format!(
                    "Remote path contains an empty component: {path}"
                )));
            }
            if component == "." || component == ".." {
                return Err(DomainError::InvalidRemotePath(format!(
                    "Remote path contains invalid traversal: {path}"
                )));
            }
        }

        Ok(Self(path))
    }

    /// Create the root path "/"
    #[must_use]
    pub fn root() -> Self {
        Self("/".to_string())
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join a path component
    ///
    /// # Errors
    /// Returns error if component is invalid
    pub fn join(&self, component: &str) -> Result<Self, DomainError> {
        validate_component(component).map_err(|_| {
            DomainError::InvalidRemotePath(format!("Invalid path component: {component}"))
        })?;

        let new_path = if self.0 == "/" {
            format!("/{component}")
        } else {
            format!("{}/{component}", self.0)
        };

        Ok(Self(new_path))
    }

    /// Resolve a root-relative path underneath this one
    #[must_use]
    pub fn join_rel(&self, rel: &RelPath) -> Self {
        let mut path = self.0.clone();
        for component in rel.components() {
            if !path.ends_with('/') {
                path.push('/');
            }
            path.push_str(component);
        }
        Self(path)
    }

    /// Get the parent path
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0 == "/" {
            return None;
        }

        match self.0.rfind('/') {
            Some(0) => Some(Self::root()),
            Some(idx) => Some(Self(self.0[..idx].to_string())),
            None => None,
        }
    }

    /// Get the file name component
    #[must_use]
    pub fn file_name(&self) -> Option<&str> {
        if self.0 == "/" {
            return None;
        }

        self.0.rsplit('/').next()
    }

    /// Iterate over the components (the user name first)
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }
}

impl Display for RemotePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RemotePath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RemotePath {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RemotePath> for String {
    fn from(path: RemotePath) -> Self {
        path.0
    }
}

// ============================================================================
// UserName
// ============================================================================

/// A remote store user name of the form `local@domain`
///
/// Only basic structural validation is done:
/// - Contains exactly one @
/// - Has non-empty local part
/// - Has non-empty domain with at least one dot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Create a new validated UserName
    ///
    /// # Errors
    /// Returns error if the name format is invalid
    pub fn new(name: String) -> Result<Self, DomainError> {
        Self::validate(&name)?;
        Ok(Self(name))
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn validate(name: &str) -> Result<(), DomainError> {
        let (local, domain) = match name.split_once('@') {
            Some(parts) => parts,
            None => {
                return Err(DomainError::InvalidUserName(format!(
                    "User name must contain '@': {name}"
                )))
            }
        };

        if local.is_empty() {
            return Err(DomainError::InvalidUserName(format!(
                "User name local part cannot be empty: {name}"
            )));
        }

        if domain.contains('@') {
            return Err(DomainError::InvalidUserName(format!(
                "User name must contain exactly one '@': {name}"
            )));
        }

        if local.contains('/') || domain.contains('/') {
            return Err(DomainError::InvalidUserName(format!(
                "User name cannot contain '/': {name}"
            )));
        }

        if domain.is_empty() || !domain.contains('.') {
            return Err(DomainError::InvalidUserName(format!(
                "User name domain must contain at least one dot: {name}"
            )));
        }

        if domain.split('.').any(str::is_empty) {
            return Err(DomainError::InvalidUserName(format!(
                "User name domain contains empty label: {name}"
            )));
        }

        Ok(())
    }
}

impl Display for UserName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UserName {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for UserName {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<UserName> for String {
    fn from(name: UserName) -> Self {
        name.0
    }
}

// ============================================================================
// Tests
// ============================================================================
