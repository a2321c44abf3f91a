//! MemoryStore - in-memory IRemoteDirectory implementation
//!
//! ## Design Notes
//!
//! - Uses `tokio::sync::Mutex` because `IRemoteDirectory` methods take `&self`
//!   while every operation mutates or inspects the shared tree.
//! - Entries live in a `BTreeMap` keyed by full remote path. The root `/`
//!   always exists and is never stored.
//! - The `seed_*` helpers create missing ancestors and accept explicit
//!   modification times. The port operations enforce that parents exist.

use std::collections::BTreeMap;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::debug;

use upsync_core::config::DEFAULT_BLOCK_SIZE;
use upsync_core::domain::entry::{DirEntry, EntryKind};
use upsync_core::domain::newtypes::{RemotePath, Timestamp};
use upsync_core::ports::remote_directory::IRemoteDirectory;

use crate::{blocks_for, StoreError};

#[derive(Debug, Clone)]
enum Node {
    Directory { modified: Timestamp },
    File { data: Vec<u8>, modified: Timestamp },
    Link { modified: Timestamp },
    Incomplete { modified: Timestamp },
}

impl Node {
    fn modified(&self) -> Timestamp {
        match self {
            Node::Directory { modified }
            | Node::File { modified, .. }
            | Node::Link { modified }
            | Node::Incomplete { modified } => *modified,
        }
    }

    fn set_modified(&mut self, time: Timestamp) {
        match self {
            Node::Directory { modified }
            | Node::File { modified, .. }
            | Node::Link { modified }
            | Node::Incomplete { modified } => *modified = time,
        }
    }
}

/// Remote store held entirely in memory
#[derive(Debug)]
pub struct MemoryStore {
    block_size: u64,
    nodes: Mutex<BTreeMap<RemotePath, Node>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates an empty store holding only the root directory
    pub fn new() -> Self {
        Self::with_block_size(DEFAULT_BLOCK_SIZE)
    }

    /// Creates an empty store reporting sizes in blocks of `block_size` bytes
    pub fn with_block_size(block_size: u64) -> Self {
        Self {
            block_size,
            nodes: Mutex::new(BTreeMap::new()),
        }
    }

    // ------------------------------------------------------------------
    // Seeding
    // ------------------------------------------------------------------

    /// Creates a directory and any missing ancestors
    pub async fn seed_directory(&self, path: &RemotePath) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        Self::seed_ancestors(&mut nodes, path)?;
        if path.parent().is_some() && !nodes.contains_key(path) {
            nodes.insert(
                path.clone(),
                Node::Directory {
                    modified: Timestamp::now(),
                },
            );
        }
        Self::expect_directory(&nodes, path)
    }

    /// Creates or replaces a file with explicit contents and time
    pub async fn seed_file(&self, path: &RemotePath, data: &[u8], modified: Timestamp) -> Result<()> {
        self.seed_leaf(
            path,
            Node::File {
                data: data.to_vec(),
                modified,
            },
        )
        .await
    }

    /// Creates a symbolic link entry
    pub async fn seed_link(&self, path: &RemotePath, modified: Timestamp) -> Result<()> {
        self.seed_leaf(path, Node::Link { modified }).await
    }

    /// Creates an entry whose contents cannot be read
    pub async fn seed_incomplete(&self, path: &RemotePath, modified: Timestamp) -> Result<()> {
        self.seed_leaf(path, Node::Incomplete { modified }).await
    }

    async fn seed_leaf(&self, path: &RemotePath, node: Node) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        Self::seed_ancestors(&mut nodes, path)?;
        if let Some(Node::Directory { .. }) = nodes.get(path) {
            return Err(StoreError::IsADirectory(path.to_string()).into());
        }
        nodes.insert(path.clone(), node);
        Ok(())
    }

    fn seed_ancestors(nodes: &mut BTreeMap<RemotePath, Node>, path: &RemotePath) -> Result<()> {
        let mut ancestors = Vec::new();
        let mut cursor = path.parent();
        while let Some(dir) = cursor {
            cursor = dir.parent();
            if cursor.is_some() {
                ancestors.push(dir);
            }
        }

        for dir in ancestors.into_iter().rev() {
            match nodes.get(&dir) {
                None => {
                    nodes.insert(
                        dir,
                        Node::Directory {
                            modified: Timestamp::now(),
                        },
                    );
                }
                Some(Node::Directory { .. }) => {}
                Some(_) => return Err(StoreError::NotADirectory(dir.to_string()).into()),
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------

    /// Returns the contents of a file, if one exists at `path`
    pub async fn contents(&self, path: &RemotePath) -> Option<Vec<u8>> {
        match self.nodes.lock().await.get(path) {
            Some(Node::File { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    /// Returns the listing entry for `path`, if it exists
    pub async fn entry(&self, path: &RemotePath) -> Option<DirEntry> {
        let nodes = self.nodes.lock().await;
        let node = nodes.get(path)?;
        let name = path.file_name()?;
        Some(self.to_entry(name, node))
    }

    /// Number of entries in the store, not counting the root
    pub async fn len(&self) -> usize {
        self.nodes.lock().await.len()
    }

    /// Returns true if the store holds nothing but the root
    pub async fn is_empty(&self) -> bool {
        self.nodes.lock().await.is_empty()
    }

    fn to_entry(&self, name: &str, node: &Node) -> DirEntry {
        let (kind, blocks) = match node {
            Node::Directory { .. } => (EntryKind::Directory, 0),
            Node::File { data, .. } => (
                EntryKind::File,
                blocks_for(data.len() as u64, self.block_size),
            ),
            Node::Link { .. } => (EntryKind::SymbolicLink, 0),
            Node::Incomplete { .. } => (EntryKind::Incomplete, 0),
        };
        DirEntry {
            name: name.to_string(),
            kind,
            blocks,
            modified: node.modified(),
        }
    }

    fn expect_directory(nodes: &BTreeMap<RemotePath, Node>, path: &RemotePath) -> Result<()> {
        if path.parent().is_none() {
            return Ok(());
        }
        match nodes.get(path) {
            Some(Node::Directory { .. }) => Ok(()),
            Some(_) => Err(StoreError::NotADirectory(path.to_string()).into()),
            None => Err(StoreError::NotFound(path.to_string()).into()),
        }
    }

    fn expect_parent(nodes: &BTreeMap<RemotePath, Node>, path: &RemotePath) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| StoreError::AlreadyExists(path.to_string()))?;
        Self::expect_directory(nodes, &parent)
    }
}

#[async_trait::async_trait]
impl IRemoteDirectory for MemoryStore {
    async fn list(&self, path: &RemotePath) -> Result<Vec<DirEntry>> {
        let nodes = self.nodes.lock().await;
        Self::expect_directory(&nodes, path)?;

        let entries: Vec<DirEntry> = nodes
            .iter()
            .filter(|(p, _)| p.parent().as_ref() == Some(path))
            .filter_map(|(p, node)| p.file_name().map(|name| self.to_entry(name, node)))
            .collect();

        debug!(path = %path, count = entries.len(), "memory store listed");
        Ok(entries)
    }

    async fn read(&self, path: &RemotePath) -> Result<Vec<u8>> {
        match self.nodes.lock().await.get(path) {
            Some(Node::File { data, .. }) => Ok(data.clone()),
            Some(Node::Directory { .. }) => Err(StoreError::IsADirectory(path.to_string()).into()),
            Some(Node::Link { .. } | Node::Incomplete { .. }) => {
                Err(StoreError::Unreadable(path.to_string()).into())
            }
            None => Err(StoreError::NotFound(path.to_string()).into()),
        }
    }

    async fn write(&self, path: &RemotePath, data: &[u8]) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        Self::expect_parent(&nodes, path)?;
        if let Some(Node::Directory { .. }) = nodes.get(path) {
            return Err(StoreError::IsADirectory(path.to_string()).into());
        }

        nodes.insert(
            path.clone(),
            Node::File {
                data: data.to_vec(),
                modified: Timestamp::now(),
            },
        );
        debug!(path = %path, bytes = data.len(), "memory store write");
        Ok(())
    }

    async fn set_mod_time(&self, path: &RemotePath, time: Timestamp) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        let node = nodes
            .get_mut(path)
            .ok_or_else(|| StoreError::NotFound(path.to_string()))?;
        node.set_modified(time);
        Ok(())
    }

    async fn create_directory(&self, path: &RemotePath) -> Result<()> {
        let mut nodes = self.nodes.lock().await;
        Self::expect_parent(&nodes, path)?;
        if nodes.contains_key(path) {
            return Err(StoreError::AlreadyExists(path.to_string()).into());
        }

        nodes.insert(
            path.clone(),
            Node::Directory {
                modified: Timestamp::now(),
            },
        );
        debug!(path = %path, "memory store mkdir");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rp(s: &str) -> RemotePath {
        s.parse().unwrap()
    }

    fn store_error(err: &anyhow::Error) -> Option<&StoreError> {
        err.downcast_ref::<StoreError>()
    }

    #[tokio::test]
    async fn test_seed_file_creates_ancestors() {
        let store = MemoryStore::new();
        store
            .seed_file(&rp("/ann@example.com/bar/baz"), b"hi", Timestamp::from_unix(100))
            .await
            .unwrap();

        let root = store.list(&rp("/ann@example.com")).await.unwrap();
        assert_eq!(root.len(), 1);
        assert_eq!(root[0].name, "bar");
        assert!(root[0].is_directory());

        let bar = store.list(&rp("/ann@example.com/bar")).await.unwrap();
        assert_eq!(bar, vec![DirEntry::file("baz", 1, Timestamp::from_unix(100))]);
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_direct_children_only() {
        let store = MemoryStore::new();
        let t = Timestamp::from_unix(1);
        store.seed_file(&rp("/u@d/b"), b"", t).await.unwrap();
        store.seed_file(&rp("/u@d/a/deep"), b"", t).await.unwrap();
        store.seed_link(&rp("/u@d/c"), t).await.unwrap();

        let names: Vec<String> = store
            .list(&rp("/u@d"))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_blocks_follow_block_size() {
        let store = MemoryStore::with_block_size(4);
        let t = Timestamp::from_unix(1);
        store.seed_file(&rp("/u@d/empty"), b"", t).await.unwrap();
        store.seed_file(&rp("/u@d/five"), b"12345", t).await.unwrap();

        let entries = store.list(&rp("/u@d")).await.unwrap();
        assert_eq!(entries[0].blocks, 0);
        assert_eq!(entries[1].blocks, 2);
    }

    #[tokio::test]
    async fn test_read_incomplete_and_link_fail() {
        let store = MemoryStore::new();
        let t = Timestamp::from_unix(1);
        store.seed_incomplete(&rp("/u@d/partial"), t).await.unwrap();
        store.seed_link(&rp("/u@d/link"), t).await.unwrap();

        let err = store.read(&rp("/u@d/partial")).await.unwrap_err();
        assert_eq!(
            store_error(&err),
            Some(&StoreError::Unreadable("/u@d/partial".into()))
        );
        assert!(store.read(&rp("/u@d/link")).await.is_err());

        let entry = store.entry(&rp("/u@d/partial")).await.unwrap();
        assert_eq!(entry.kind, EntryKind::Incomplete);
    }

    #[tokio::test]
    async fn test_write_requires_parent_and_stamps_now() {
        let store = MemoryStore::new();
        store.seed_directory(&rp("/u@d")).await.unwrap();

        let err = store.write(&rp("/u@d/missing/f"), b"x").await.unwrap_err();
        assert_eq!(
            store_error(&err),
            Some(&StoreError::NotFound("/u@d/missing".into()))
        );

        let before = Timestamp::now();
        store.write(&rp("/u@d/f"), b"x").await.unwrap();
        let entry = store.entry(&rp("/u@d/f")).await.unwrap();
        assert!(entry.modified >= before);

        store
            .set_mod_time(&rp("/u@d/f"), Timestamp::from_unix(5))
            .await
            .unwrap();
        let entry = store.entry(&rp("/u@d/f")).await.unwrap();
        assert_eq!(entry.modified, Timestamp::from_unix(5));
    }

    #[tokio::test]
    async fn test_create_directory_rules() {
        let store = MemoryStore::new();
        store.create_directory(&rp("/u@d")).await.unwrap();
        store.create_directory(&rp("/u@d/sub")).await.unwrap();

        let err = store.create_directory(&rp("/u@d/sub")).await.unwrap_err();
        assert!(matches!(store_error(&err), Some(StoreError::AlreadyExists(_))));

        let err = store.create_directory(&rp("/u@d/x/y")).await.unwrap_err();
        assert!(matches!(store_error(&err), Some(StoreError::NotFound(_))));

        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_list_missing_or_file_fails() {
        let store = MemoryStore::new();
        store
            .seed_file(&rp("/u@d/f"), b"x", Timestamp::from_unix(1))
            .await
            .unwrap();

        assert!(store.list(&rp("/nobody@d")).await.is_err());
        let err = store.list(&rp("/u@d/f")).await.unwrap_err();
        assert!(matches!(store_error(&err), Some(StoreError::NotADirectory(_))));
        assert!(store.list(&RemotePath::root()).await.is_ok());
    }
}
