//! Staleness guard and fatal conditions

use upsync_core::domain::entry::EntryKind;
use upsync_sync::SyncError;

use crate::common::{rp, Fixture};

#[tokio::test]
async fn test_staleness_guard_boundary() {
    let fx = Fixture::new().await;
    fx.write_local("before", b"old", 999);
    fx.write_local("exact", b"edge", 1_000);
    fx.write_local("after", b"new", 1_001);
    fx.set_last_sync(1_000);

    let report = fx.sync().await.unwrap();

    assert!(fx.store.entry(&rp("before")).await.is_none());
    assert_eq!(fx.store.contents(&rp("exact")).await.unwrap(), b"edge");
    assert_eq!(fx.store.contents(&rp("after")).await.unwrap(), b"new");
    assert_eq!(report.skipped_old, 1);
    assert_eq!(report.files_pushed, 2);
    assert_eq!(
        fx.lines(),
        vec!["push after", "skipping old before", "push exact"]
    );
}

#[tokio::test]
async fn test_staleness_guard_applies_when_local_is_newer() {
    let fx = Fixture::new().await;
    fx.seed_remote("f", b"remote", 100).await;
    fx.write_local("f", b"local", 200);
    fx.set_last_sync(5_000);

    let report = fx.sync().await.unwrap();

    assert_eq!(fx.store.contents(&rp("f")).await.unwrap(), b"remote");
    assert_eq!(std::fs::read(fx.local("f")).unwrap(), b"local");
    assert_eq!(report.skipped_old, 1);
    assert_eq!(report.transfers(), 0);
}

#[tokio::test]
async fn test_remote_directory_against_local_file_is_fatal() {
    let fx = Fixture::new().await;
    fx.seed_remote("bar/inner", b"inner", 100).await;
    fx.write_local("bar", b"local file", 2_000);
    fx.set_last_sync(1_000);

    let err = fx.sync().await.unwrap_err();

    assert!(matches!(&err, SyncError::KindConflict { path } if path.to_string() == "bar"));
    assert_eq!(std::fs::read(fx.local("bar")).unwrap(), b"local file");
    assert_eq!(fx.store.entry(&rp("bar")).await.unwrap().kind, EntryKind::Directory);
    // A failed run leaves the previous-run time alone.
    assert_eq!(fx.last_sync(), 1_000);
}

#[tokio::test]
async fn test_remote_file_against_local_directory_is_fatal() {
    let fx = Fixture::new().await;
    fx.seed_remote("bar", b"remote file", 100).await;
    fx.mkdir_local("bar");
    fx.write_local("bar/inner", b"inner", 2_000);
    fx.set_last_sync(1_000);

    let err = fx.sync().await.unwrap_err();

    assert!(err.is_structural());
    assert!(fx.local("bar").is_dir());
    assert!(fx.store.entry(&rp("bar/inner")).await.is_none());
    assert_eq!(fx.store.contents(&rp("bar")).await.unwrap(), b"remote file");
}

#[tokio::test]
async fn test_local_symlink_aborts_before_any_transfer_at_its_level() {
    let fx = Fixture::new().await;
    fx.seed_remote("a_remote", b"remote", 100).await;
    fx.write_local("a_local", b"local", 2_000);
    std::os::unix::fs::symlink(fx.local("a_local"), fx.local("z_link")).unwrap();
    fx.set_last_sync(1_000);

    let err = fx.sync().await.unwrap_err();

    assert!(matches!(&err, SyncError::LocalSymlink { path } if path.to_string() == "z_link"));
    assert!(!fx.local("a_remote").exists());
    assert!(fx.store.entry(&rp("a_local")).await.is_none());
    assert!(fx.lines().is_empty());
}

#[tokio::test]
async fn test_nested_local_symlink_is_fatal() {
    let fx = Fixture::new().await;
    fx.mkdir_local("sub");
    std::os::unix::fs::symlink("/tmp", fx.local("sub/escape")).unwrap();
    fx.set_last_sync(1_000);

    let err = fx.sync().await.unwrap_err();

    assert_eq!(err.to_string(), "local symlink not allowed: sub/escape");
}

#[tokio::test]
async fn test_missing_remote_root_is_reported_as_remote_error() {
    let fx = Fixture::new().await;
    let engine = fx.engine();
    let session = engine
        .begin_session("/nobody@example.com".parse().unwrap(), fx.local_root())
        .await
        .unwrap();

    let err = engine.run(&session).await.unwrap_err();

    assert!(matches!(err, SyncError::Remote { op: "list", .. }));
}
