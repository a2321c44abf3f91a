//! Leaf transfer operations
//!
//! A transfer copies the full contents of one file across and then stamps
//! the destination with the source's modification time, so the next run
//! sees both sides as equal.
//!
//! Neither operation reports progress or consults the staleness guard; the
//! engine does both before calling in.

use tracing::{debug, instrument};

use upsync_core::domain::newtypes::{RemotePath, SyncPath, Timestamp};
use upsync_core::ports::local_filesystem::ILocalFileSystem;
use upsync_core::ports::remote_directory::IRemoteDirectory;

use crate::SyncError;

/// Copies a remote file into the local tree
///
/// The local file is written with permission bits `mode` and its
/// modification time is set to `modified`.
#[instrument(skip(remote, local), fields(from = %from, to = %to))]
pub async fn pull(
    remote: &dyn IRemoteDirectory,
    local: &dyn ILocalFileSystem,
    from: &RemotePath,
    to: &SyncPath,
    modified: Timestamp,
    mode: u32,
) -> Result<(), SyncError> {
    let data = remote
        .read(from)
        .await
        .map_err(SyncError::remote("read", from))?;

    local
        .write_file(to, &data, mode)
        .await
        .map_err(SyncError::local("write", to))?;

    local
        .set_mod_time(to, modified)
        .await
        .map_err(SyncError::local("set mod time", to))?;

    debug!(bytes = data.len(), %modified, "Pulled file");
    Ok(())
}

/// Copies a local file into the remote store
///
/// The remote entry's modification time is overridden with `modified`.
#[instrument(skip(remote, local), fields(from = %from, to = %to))]
pub async fn push(
    remote: &dyn IRemoteDirectory,
    local: &dyn ILocalFileSystem,
    from: &SyncPath,
    to: &RemotePath,
    modified: Timestamp,
) -> Result<(), SyncError> {
    let data = local
        .read_file(from)
        .await
        .map_err(SyncError::local("read", from))?;

    remote
        .write(to, &data)
        .await
        .map_err(SyncError::remote("write", to))?;

    remote
        .set_mod_time(to, modified)
        .await
        .map_err(SyncError::remote("set mod time", to))?;

    debug!(bytes = data.len(), %modified, "Pushed file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filesystem::LocalFileSystemAdapter;
    use std::os::unix::fs::PermissionsExt;
    use upsync_store::MemoryStore;

    fn local_root(dir: &tempfile::TempDir) -> SyncPath {
        SyncPath::new(dir.path().to_path_buf()).unwrap()
    }

    #[tokio::test]
    async fn test_pull_copies_content_mode_and_time() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let root: RemotePath = "/ann@example.com".parse().unwrap();
        store.seed_directory(&root).await.unwrap();
        let remote_file = root.join("foo").unwrap();
        store
            .seed_file(&remote_file, b"remote data", Timestamp::from_unix(1_000_000))
            .await
            .unwrap();

        let local = LocalFileSystemAdapter::new();
        let target = local_root(&dir).join("foo").unwrap();

        pull(&store, &local, &remote_file, &target, Timestamp::from_unix(1_000_000), 0o600)
            .await
            .unwrap();

        assert_eq!(std::fs::read(target.as_path()).unwrap(), b"remote data");
        let meta = std::fs::metadata(target.as_path()).unwrap();
        assert_eq!(meta.permissions().mode() & 0o777, 0o600);
        assert_eq!(
            Timestamp::from_system_time(meta.modified().unwrap()),
            Timestamp::from_unix(1_000_000)
        );
    }

    #[tokio::test]
    async fn test_push_copies_content_and_time() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("bar"), b"local data").unwrap();

        let store = MemoryStore::new();
        let root: RemotePath = "/ann@example.com".parse().unwrap();
        store.seed_directory(&root).await.unwrap();

        let local = LocalFileSystemAdapter::new();
        let source = local_root(&dir).join("bar").unwrap();
        let target = root.join("bar").unwrap();

        push(&store, &local, &source, &target, Timestamp::from_unix(2_000_000))
            .await
            .unwrap();

        assert_eq!(store.contents(&target).await.unwrap(), b"local data");
        let entries = store.list(&root).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].modified, Timestamp::from_unix(2_000_000));
    }

    #[tokio::test]
    async fn test_pull_of_missing_remote_file_is_remote_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new();
        let local = LocalFileSystemAdapter::new();
        let from: RemotePath = "/ann@example.com/missing".parse().unwrap();
        let to = local_root(&dir).join("missing").unwrap();

        let err = pull(&store, &local, &from, &to, Timestamp::from_unix(0), 0o600)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Remote { op: "read", .. }));
        assert!(!to.as_path().exists());
    }
}
